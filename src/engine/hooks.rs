//! Hook discovery and the settings-document merge/unmerge steps.
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::context::ExecutionContext;
use crate::config::{Module, Operation};
use crate::error::HookMergeError;
use crate::resources::json::{load_json, save_json};
use crate::resources::settings::{merge_module_hooks, unmerge_module_hooks};

/// Location of a module's hook declarations inside a copied directory.
const HOOKS_FILE: &[&str] = &["hooks", "hooks.json"];

/// Find the hook declarations of a module.
///
/// Each `copy_dir` target under the install directory is searched first,
/// then each `copy_dir` source. The first `hooks/hooks.json` that parses
/// wins; unreadable or malformed candidates are skipped.
#[must_use]
pub fn find_module_hooks(module: &Module, ctx: &ExecutionContext) -> Option<Value> {
    let copy_dirs = || {
        module.operations.iter().filter_map(|op| match op {
            Operation::CopyDir { source, target } => Some((Path::new(source), Path::new(target))),
            _ => None,
        })
    };

    let targets = copy_dirs().map(|(_, target)| ctx.target_path(target));
    let sources = copy_dirs().map(|(source, _)| ctx.source_path(source));

    targets
        .chain(sources)
        .map(|dir| hooks_file(&dir))
        .filter(|file| file.is_file())
        .find_map(|file| load_json(&file).ok())
}

fn hooks_file(dir: &Path) -> PathBuf {
    HOOKS_FILE.iter().fold(dir.to_path_buf(), |path, part| path.join(part))
}

/// Merge `hooks_config` into the settings document on behalf of `name` and
/// log one `INFO` entry.
///
/// # Errors
///
/// Returns a [`HookMergeError`] if the settings document or the declarations
/// are malformed, or the settings document cannot be written. The settings
/// document is not rewritten on error.
pub fn merge_hooks_to_settings(
    name: &str,
    hooks_config: &Value,
    ctx: &ExecutionContext,
) -> Result<(), HookMergeError> {
    let path = ctx.settings_file();
    let mut settings = load_settings(&path)?;
    merge_module_hooks(&mut settings, name, hooks_config)?;
    save_json(&path, &settings)?;
    ctx.log.info(&format!("Merged hooks for module: {name}"));
    Ok(())
}

/// Remove every hook entry owned by `name` from the settings document.
///
/// The document is only rewritten (and an `INFO` entry logged) when an entry
/// was actually removed.
///
/// # Errors
///
/// Returns a [`HookMergeError`] if the settings document is malformed or
/// cannot be written.
pub fn unmerge_hooks_from_settings(name: &str, ctx: &ExecutionContext) -> Result<(), HookMergeError> {
    let path = ctx.settings_file();
    if !path.exists() {
        return Ok(());
    }
    let mut settings = load_settings(&path)?;
    if unmerge_module_hooks(&mut settings, name)? > 0 {
        save_json(&path, &settings)?;
        ctx.log.info(&format!("Removed hooks for module: {name}"));
    }
    Ok(())
}

/// Load the settings document, treating a missing file as `{}`.
fn load_settings(path: &Path) -> Result<Value, HookMergeError> {
    if path.exists() {
        Ok(load_json(path)?)
    } else {
        Ok(Value::Object(Map::new()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn context(root: &Path) -> ExecutionContext {
        let install = root.join("install");
        let config = root.join("config");
        fs::create_dir_all(&install).unwrap();
        fs::create_dir_all(&config).unwrap();
        ExecutionContext::new(install.clone(), config, install.join("install.log"))
    }

    fn module() -> Module {
        Module {
            operations: vec![Operation::CopyDir {
                source: "templates/tools".into(),
                target: "tools".into(),
            }],
            ..Module::default()
        }
    }

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn installed_target_wins_over_source() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        write(&ctx.install_dir.join("tools/hooks/hooks.json"), r#"{"from": "target"}"#);
        write(&ctx.config_dir.join("templates/tools/hooks/hooks.json"), r#"{"from": "source"}"#);

        let found = find_module_hooks(&module(), &ctx).unwrap();
        assert_eq!(found["from"], "target");
    }

    #[test]
    fn malformed_target_falls_back_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        write(&ctx.install_dir.join("tools/hooks/hooks.json"), "{ broken");
        write(&ctx.config_dir.join("templates/tools/hooks/hooks.json"), r#"{"from": "source"}"#);

        let found = find_module_hooks(&module(), &ctx).unwrap();
        assert_eq!(found["from"], "source");
    }

    #[test]
    fn no_hooks_file_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(find_module_hooks(&module(), &ctx).is_none());
        assert!(find_module_hooks(&Module::default(), &ctx).is_none());
    }

    #[test]
    fn merge_then_unmerge_round_trips_settings() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        write(&ctx.settings_file(), r#"{"model": "opus"}"#);
        let hooks = json!({"hooks": {"Stop": [{"command": "notify.sh"}]}});

        merge_hooks_to_settings("tools", &hooks, &ctx).unwrap();
        let merged = load_json(&ctx.settings_file()).unwrap();
        assert_eq!(merged["hooks"]["Stop"][0]["__module__"], "tools");

        unmerge_hooks_from_settings("tools", &ctx).unwrap();
        let restored = load_json(&ctx.settings_file()).unwrap();
        assert_eq!(restored, json!({"model": "opus", "hooks": {}}));

        let log = fs::read_to_string(&ctx.log_file).unwrap();
        assert!(log.contains("INFO: Merged hooks for module: tools"));
        assert!(log.contains("INFO: Removed hooks for module: tools"));
    }

    #[test]
    fn unmerge_without_owned_entries_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let original = "{\"hooks\":{\"Stop\":[]}}";
        write(&ctx.settings_file(), original);

        unmerge_hooks_from_settings("tools", &ctx).unwrap();

        assert_eq!(fs::read_to_string(ctx.settings_file()).unwrap(), original);
        assert!(!ctx.log_file.exists());
    }

    #[test]
    fn malformed_settings_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        write(&ctx.settings_file(), "{ not json");
        let hooks = json!({"hooks": {"Stop": [{"command": "notify.sh"}]}});

        assert!(merge_hooks_to_settings("tools", &hooks, &ctx).is_err());
        assert_eq!(fs::read_to_string(ctx.settings_file()).unwrap(), "{ not json");
    }
}

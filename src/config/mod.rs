//! Configuration document: modules, their operations, and selection.
pub mod operation;
pub mod validation;

pub use operation::Operation;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use validation::{ConfigValidator as _, DocumentValidator, OperationValidator, ValidationIssue};

/// The loaded configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Free-form document version.
    pub version: Value,
    /// Default install directory (`~` is expanded at resolution time).
    pub install_dir: String,
    /// Log file, relative paths resolve against the install directory.
    pub log_file: String,
    /// Modules in declaration order.
    pub modules: IndexMap<String, Module>,
}

/// A named, independently installable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether the module is installed by default.
    #[serde(default)]
    pub enabled: bool,
    /// Operations, applied in order.
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Config {
    /// Load and validate the configuration at `path`.
    ///
    /// Validation errors abort loading; warnings are left for
    /// [`Config::warnings`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist,
    /// [`ConfigError::Invalid`] if it is not valid JSON or does not match the
    /// document shape, and [`ConfigError::Validation`] for structural errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Invalid {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            }
        })?;
        let document: Value =
            serde_json::from_str(&text).map_err(|e| ConfigError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_document(document, path, config_dir)
    }

    /// Build a configuration from an already-parsed JSON document.
    ///
    /// `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for structural errors and
    /// [`ConfigError::Invalid`] if the document does not deserialise.
    pub fn from_document(
        document: Value,
        path: &Path,
        config_dir: &Path,
    ) -> Result<Self, ConfigError> {
        reject_errors(DocumentValidator::new(&document).validate(config_dir))?;

        let config: Self = serde_json::from_value(document).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        reject_errors(OperationValidator::new(&config.modules).validate(config_dir))?;
        Ok(config)
    }

    /// Non-fatal findings, e.g. declared sources missing under `config_dir`.
    #[must_use]
    pub fn warnings(&self, config_dir: &Path) -> Vec<ValidationIssue> {
        OperationValidator::new(&self.modules)
            .validate(config_dir)
            .into_iter()
            .filter(|issue| !issue.is_error())
            .collect()
    }

    /// Look up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }
}

fn reject_errors(issues: Vec<ValidationIssue>) -> Result<(), ConfigError> {
    let errors: Vec<String> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(ToString::to_string)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

/// Select modules by a command-line selection string.
///
/// `all` (any case) selects every module; otherwise `selection` is a
/// comma-separated list of names. Blank entries are ignored and duplicates
/// collapse. Order follows the selection string.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownModule`] for the first name not defined in
/// the configuration.
pub fn select_modules<'a>(
    config: &'a Config,
    selection: &str,
) -> Result<Vec<(&'a str, &'a Module)>, ConfigError> {
    if selection.trim().eq_ignore_ascii_case("all") {
        return Ok(config
            .modules
            .iter()
            .map(|(name, module)| (name.as_str(), module))
            .collect());
    }

    let mut selected: Vec<(&str, &Module)> = Vec::new();
    for name in selection.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let (key, module) = config
            .modules
            .get_key_value(name)
            .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))?;
        if !selected.iter().any(|(n, _)| *n == key.as_str()) {
            selected.push((key.as_str(), module));
        }
    }
    Ok(selected)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Config {
        Config::from_document(
            json!({
                "version": "1.0",
                "install_dir": "~/.claude",
                "log_file": "install.log",
                "modules": {
                    "dev": {"description": "Core workflow", "enabled": true, "operations": []},
                    "tools": {"operations": [
                        {"type": "copy_dir", "source": "templates/tools", "target": "tools"}
                    ]},
                    "docs": {"enabled": false}
                }
            }),
            Path::new("config.json"),
            Path::new("."),
        )
        .unwrap()
    }

    #[test]
    fn modules_keep_declaration_order() {
        let config = sample();
        let names: Vec<&String> = config.modules.keys().collect();
        assert_eq!(names, ["dev", "tools", "docs"]);
    }

    #[test]
    fn module_fields_default() {
        let config = sample();
        let docs = config.module("docs").unwrap();
        assert!(!docs.enabled);
        assert!(docs.description.is_empty());
        assert!(docs.operations.is_empty());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_invalid_json_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn load_unknown_operation_type_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"version": "1", "install_dir": "x", "log_file": "l",
                "modules": {"m": {"operations": [{"type": "chmod", "source": "a"}]}}}"#,
        )
        .unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("chmod"), "{err}");
    }

    #[test]
    fn load_missing_required_key_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": "1", "modules": {}}"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("install_dir"));
    }

    #[test]
    fn escaping_target_fails_validation() {
        let err = Config::from_document(
            json!({
                "version": "1", "install_dir": "x", "log_file": "l",
                "modules": {"m": {"operations": [
                    {"type": "copy_file", "source": "a", "target": "../../etc/passwd"}
                ]}}
            }),
            Path::new("config.json"),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn warnings_report_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let warnings = sample().warnings(dir.path());
        assert!(
            warnings
                .iter()
                .any(|w| w.message.contains("templates/tools"))
        );
        assert!(warnings.iter().all(|w| !w.is_error()));
    }

    #[test]
    fn select_all_is_case_insensitive() {
        let config = sample();
        assert_eq!(select_modules(&config, " ALL ").unwrap().len(), 3);
    }

    #[test]
    fn select_list_skips_blanks_and_duplicates() {
        let config = sample();
        let selected = select_modules(&config, "tools, ,dev,tools").unwrap();
        let names: Vec<&str> = selected.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["tools", "dev"]);
    }

    #[test]
    fn select_unknown_module_fails() {
        let config = sample();
        let err = select_modules(&config, "dev,nope").unwrap_err();
        assert_eq!(err.to_string(), "Module 'nope' not found");
    }
}

//! Resolved paths and per-run state shared by every engine step.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::logging::Logger;
use crate::platform::Platform;
use crate::resources::fs::{is_strictly_inside, normalize_path};

/// Install directory used when neither the command line nor the
/// configuration names one.
pub const DEFAULT_INSTALL_DIR: &str = "~/.claude";

/// Log file used when the configuration does not name one.
pub const DEFAULT_LOG_FILE: &str = "install.log";

/// Shared settings document, relative to the install directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Status ledger, relative to the install directory.
pub const STATUS_FILE: &str = "installed_modules.json";

/// Status ledger backup taken before a run, relative to the install directory.
pub const STATUS_BACKUP_FILE: &str = "installed_modules.json.bak";

/// Run-time overrides supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Path of the configuration file.
    pub config_path: PathBuf,
    /// Install directory override.
    pub install_dir: Option<String>,
    /// Overwrite existing targets and keep going after a module fails.
    pub force: bool,
    /// Mirror log entries to the console.
    pub verbose: bool,
}

/// Fully-resolved state for one installer invocation.
///
/// Owned by the caller for the duration of the run and passed by reference
/// to every operation.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Absolute install directory.
    pub install_dir: PathBuf,
    /// Install log.
    pub log_file: PathBuf,
    /// Status ledger.
    pub status_file: PathBuf,
    /// Absolute directory holding the configuration file.
    pub config_dir: PathBuf,
    /// Overwrite existing targets.
    pub force: bool,
    /// Mirror log entries to the console.
    pub verbose: bool,
    /// Status ledger backup, set once one has been taken.
    pub status_backup: Option<PathBuf>,
    /// Install-log writer.
    pub log: Logger,
    /// Host platform, for command translation.
    pub platform: Platform,
    /// Paths newly created this run, in creation order.
    applied_paths: Vec<PathBuf>,
}

impl ExecutionContext {
    /// Create a context from already-absolute directories.
    #[must_use]
    pub fn new(install_dir: PathBuf, config_dir: PathBuf, log_file: PathBuf) -> Self {
        let status_file = install_dir.join(STATUS_FILE);
        Self {
            install_dir,
            log: Logger::new(log_file.clone()),
            log_file,
            status_file,
            config_dir,
            force: false,
            verbose: false,
            status_backup: None,
            platform: Platform::detect(),
            applied_paths: Vec::new(),
        }
    }

    /// Resolve every path of a run from the loaded configuration and the
    /// caller's overrides.
    ///
    /// - config dir: parent of the canonical configuration path
    /// - install dir: the override unless it is the default, else the
    ///   configuration's `install_dir`, else [`DEFAULT_INSTALL_DIR`]
    /// - log file: the configuration's `log_file` (default
    ///   [`DEFAULT_LOG_FILE`]), relative paths joined to the install dir
    ///
    /// `~` is expanded in all of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration path cannot be made absolute or
    /// a `~` path is used while no home directory is known.
    pub fn resolve(config: &Config, options: &RunOptions) -> Result<Self> {
        let config_path = absolute(&expand_tilde(&options.config_path)?)?;
        let config_dir = config_path
            .parent()
            .map_or_else(|| config_path.clone(), Path::to_path_buf);

        let install_raw = match options.install_dir.as_deref() {
            Some(dir) if !dir.is_empty() && dir != DEFAULT_INSTALL_DIR => dir,
            _ if !config.install_dir.is_empty() => config.install_dir.as_str(),
            _ => DEFAULT_INSTALL_DIR,
        };
        let install_dir = absolute(&expand_tilde(Path::new(install_raw))?)?;

        let log_raw = if config.log_file.is_empty() {
            DEFAULT_LOG_FILE
        } else {
            config.log_file.as_str()
        };
        let log_file = expand_tilde(Path::new(log_raw))?;
        let log_file = if log_file.is_absolute() {
            normalize_path(&log_file)
        } else {
            normalize_path(&install_dir.join(log_file))
        };

        let mut ctx = Self::new(install_dir, config_dir, log_file);
        ctx.force = options.force;
        ctx.verbose = options.verbose;
        Ok(ctx)
    }

    /// Settings document path.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.install_dir.join(SETTINGS_FILE)
    }

    /// Status ledger backup path.
    #[must_use]
    pub fn status_backup_file(&self) -> PathBuf {
        self.install_dir.join(STATUS_BACKUP_FILE)
    }

    /// Resolve an operation source against the config directory.
    #[must_use]
    pub fn source_path(&self, source: &Path) -> PathBuf {
        normalize_path(&self.config_dir.join(source))
    }

    /// Resolve an operation target against the install directory.
    #[must_use]
    pub fn target_path(&self, target: &Path) -> PathBuf {
        normalize_path(&self.install_dir.join(target))
    }

    /// Record `path` as newly created by this run.
    ///
    /// The install directory itself, paths outside it, and paths already
    /// recorded are ignored.
    pub fn record_created(&mut self, path: &Path) {
        let path = normalize_path(path);
        if is_strictly_inside(&path, &self.install_dir) && !self.applied_paths.contains(&path) {
            self.applied_paths.push(path);
        }
    }

    /// Paths recorded so far, in creation order.
    #[must_use]
    pub fn applied_paths(&self) -> &[PathBuf] {
        &self.applied_paths
    }

    /// Current length of the applied-paths ledger.
    ///
    /// Taken before a module runs so that a rollback can be limited to what
    /// that module created.
    #[must_use]
    pub const fn applied_mark(&self) -> usize {
        self.applied_paths.len()
    }

    /// Remove and return every path recorded after `mark`.
    pub fn take_applied_since(&mut self, mark: usize) -> Vec<PathBuf> {
        let mark = mark.min(self.applied_paths.len());
        self.applied_paths.split_off(mark)
    }
}

/// The user's home directory, from `HOME` (or `USERPROFILE` on Windows).
///
/// # Errors
///
/// Returns an error if neither variable is set.
pub fn home_dir() -> Result<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .map_err(|_| anyhow::anyhow!("neither USERPROFILE nor HOME environment variable is set"))?
    } else {
        std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable is not set"))?
    };
    Ok(PathBuf::from(home))
}

/// Expand a leading `~` component to the home directory.
///
/// # Errors
///
/// Returns an error if `path` starts with `~` and no home directory is known.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Make `path` absolute and lexically normal, resolving symlinks when the
/// path exists.
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return Ok(canonical);
    }
    let absolute = std::path::absolute(path)
        .with_context(|| format!("resolving path {}", path.display()))?;
    Ok(normalize_path(&absolute))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn config(install_dir: &str, log_file: &str) -> Config {
        Config {
            version: serde_json::json!("1.0"),
            install_dir: install_dir.to_string(),
            log_file: log_file.to_string(),
            modules: IndexMap::new(),
        }
    }

    fn options(config_path: &Path, install_dir: Option<&str>) -> RunOptions {
        RunOptions {
            config_path: config_path.to_path_buf(),
            install_dir: install_dir.map(str::to_string),
            force: true,
            verbose: false,
        }
    }

    #[test]
    fn resolve_prefers_explicit_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.json");
        std::fs::write(&cfg_path, "{}").unwrap();
        let target = dir.path().join("target");
        let cfg = config(dir.path().join("from-config").to_str().unwrap(), "install.log");

        let ctx =
            ExecutionContext::resolve(&cfg, &options(&cfg_path, target.to_str())).unwrap();

        assert_eq!(ctx.install_dir, normalize_path(&std::path::absolute(&target).unwrap()));
        assert_eq!(ctx.config_dir, dunce::canonicalize(dir.path()).unwrap());
        assert_eq!(ctx.log_file, ctx.install_dir.join("install.log"));
        assert_eq!(ctx.status_file, ctx.install_dir.join(STATUS_FILE));
        assert!(ctx.force);
    }

    #[test]
    fn resolve_default_override_falls_back_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.json");
        let from_config = dir.path().join("from-config");
        let cfg = config(from_config.to_str().unwrap(), "logs/run.log");

        let ctx = ExecutionContext::resolve(&cfg, &options(&cfg_path, Some(DEFAULT_INSTALL_DIR)))
            .unwrap();

        assert!(ctx.install_dir.ends_with("from-config"));
        assert!(ctx.log_file.ends_with("from-config/logs/run.log"));
    }

    #[test]
    fn resolve_keeps_absolute_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("elsewhere/install.log");
        let cfg = config(dir.path().to_str().unwrap(), log.to_str().unwrap());

        let ctx =
            ExecutionContext::resolve(&cfg, &options(&dir.path().join("c.json"), None)).unwrap();

        assert_eq!(ctx.log_file, log);
    }

    #[test]
    fn expand_tilde_only_touches_leading_component() {
        let home = home_dir().unwrap();
        assert_eq!(expand_tilde(Path::new("~/.claude")).unwrap(), home.join(".claude"));
        assert_eq!(
            expand_tilde(Path::new("/opt/~x")).unwrap(),
            PathBuf::from("/opt/~x")
        );
    }

    #[test]
    fn record_created_ignores_root_outside_and_duplicates() {
        let mut ctx = ExecutionContext::new(
            PathBuf::from("/install"),
            PathBuf::from("/config"),
            PathBuf::from("/install/install.log"),
        );
        ctx.record_created(Path::new("/install/tools"));
        ctx.record_created(Path::new("/install/tools/"));
        ctx.record_created(Path::new("/install"));
        ctx.record_created(Path::new("/elsewhere/file"));
        ctx.record_created(Path::new("/install/../escape"));
        ctx.record_created(Path::new("/install/settings.json"));

        assert_eq!(
            ctx.applied_paths(),
            [
                PathBuf::from("/install/tools"),
                PathBuf::from("/install/settings.json")
            ]
        );
    }

    #[test]
    fn take_applied_since_splits_at_mark() {
        let mut ctx = ExecutionContext::new(
            PathBuf::from("/install"),
            PathBuf::from("/config"),
            PathBuf::from("/install/install.log"),
        );
        ctx.record_created(Path::new("/install/a"));
        let mark = ctx.applied_mark();
        ctx.record_created(Path::new("/install/b"));
        ctx.record_created(Path::new("/install/c"));

        let taken = ctx.take_applied_since(mark);

        assert_eq!(taken, [PathBuf::from("/install/b"), PathBuf::from("/install/c")]);
        assert_eq!(ctx.applied_paths(), [PathBuf::from("/install/a")]);
        assert!(ctx.take_applied_since(10).is_empty());
    }

    #[test]
    fn target_and_source_paths_are_normalised() {
        let ctx = ExecutionContext::new(
            PathBuf::from("/install"),
            PathBuf::from("/config"),
            PathBuf::from("/install/install.log"),
        );
        assert_eq!(ctx.target_path(Path::new("./tools")), PathBuf::from("/install/tools"));
        assert_eq!(
            ctx.source_path(Path::new("templates/../tools")),
            PathBuf::from("/config/tools")
        );
    }
}

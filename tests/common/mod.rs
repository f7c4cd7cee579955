// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project (config directory plus
// install directory) and a fluent builder so each integration test can set
// up an isolated environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use modinstall_cli::commands::CommandSetup;
use modinstall_cli::engine::RunOptions;

/// An isolated project backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `config/config.json` written by [`TestProject::setup`]
/// - `config/...` source trees added with [`TestProject::with_file`]
/// - `install/` the install directory (not created up front)
pub struct TestProject {
    _dir: tempfile::TempDir,
    root: PathBuf,
    modules: Map<String, Value>,
}

impl TestProject {
    /// Create an empty project.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = fs::canonicalize(dir.path()).expect("canonicalize temp dir");
        fs::create_dir_all(root.join("config")).expect("create config dir");
        Self {
            _dir: dir,
            root,
            modules: Map::new(),
        }
    }

    /// Directory holding `config.json` and the module sources.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    /// The install directory.
    pub fn install_dir(&self) -> PathBuf {
        self.root.join("install")
    }

    /// Path of an installed file.
    pub fn installed(&self, rel: &str) -> PathBuf {
        self.install_dir().join(rel)
    }

    /// Add a source file under the config directory.
    pub fn with_file(self, rel: &str, contents: &str) -> Self {
        write_file(&self.config_dir().join(rel), contents);
        self
    }

    /// Declare a module with the given operation list.
    pub fn with_module(mut self, name: &str, operations: Value) -> Self {
        self.modules.insert(
            name.to_string(),
            json!({
                "description": format!("{name} module"),
                "enabled": true,
                "operations": operations,
            }),
        );
        self
    }

    /// Write `config.json` and return its path.
    pub fn write_config(&self) -> PathBuf {
        let path = self.config_dir().join("config.json");
        let document = json!({
            "version": "1.0",
            "install_dir": "~/.claude",
            "log_file": "install.log",
            "modules": self.modules,
        });
        let text = serde_json::to_string_pretty(&document).expect("serialize config");
        fs::write(&path, text).expect("write config.json");
        path
    }

    /// Run options pointing at this project.
    pub fn options(&self, force: bool) -> RunOptions {
        RunOptions {
            config_path: self.write_config(),
            install_dir: Some(self.install_dir().display().to_string()),
            force,
            verbose: false,
        }
    }

    /// Write the config and run the common command setup.
    pub fn setup(&self, force: bool) -> CommandSetup {
        CommandSetup::init(&self.options(force)).expect("command setup")
    }

    /// Parse a JSON document from the install directory.
    pub fn read_json(&self, rel: &str) -> Value {
        let text = fs::read_to_string(self.installed(rel)).expect("read installed JSON");
        serde_json::from_str(&text).expect("parse installed JSON")
    }

    /// The status ledger.
    pub fn ledger(&self) -> Value {
        self.read_json("installed_modules.json")
    }

    /// The install log, or an empty string if nothing was logged.
    pub fn log(&self) -> String {
        fs::read_to_string(self.installed("install.log")).unwrap_or_default()
    }
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

//! Command-line interface definition.
use clap::Parser;
use std::path::PathBuf;

use crate::engine::RunOptions;
use crate::engine::context::DEFAULT_INSTALL_DIR;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config.json";

/// Build version, from `git describe` when available.
pub const VERSION: &str = match option_env!("MODINSTALL_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point for the module installer.
#[derive(Parser, Debug)]
#[command(
    name = "modinstall",
    about = "Install, track and remove configuration modules",
    version = VERSION
)]
pub struct Cli {
    /// Install directory
    #[arg(long, default_value = DEFAULT_INSTALL_DIR)]
    pub install_dir: String,

    /// Modules to install or uninstall (comma-separated, or "all")
    #[arg(short, long)]
    pub module: Option<String>,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// List available modules
    #[arg(long)]
    pub list_modules: bool,

    /// Show the installed state of every module
    #[arg(long)]
    pub status: bool,

    /// Uninstall the modules given with --module
    #[arg(long)]
    pub uninstall: bool,

    /// Overwrite existing files and keep going after a module fails
    #[arg(long)]
    pub force: bool,

    /// Mirror install-log entries to the console
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a parsed command line asks for, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `--list-modules`
    List,
    /// `--status`
    Status,
    /// `--uninstall`, with the `--module` selection if one was given
    Uninstall(Option<String>),
    /// `--module <selection>`
    Install(String),
    /// No selection: interactive management
    Interactive,
}

impl Cli {
    /// The action requested by the flags.
    #[must_use]
    pub fn action(&self) -> Action {
        if self.list_modules {
            Action::List
        } else if self.status {
            Action::Status
        } else if self.uninstall {
            Action::Uninstall(self.module.clone())
        } else if let Some(selection) = self.module.as_ref().filter(|m| !m.trim().is_empty()) {
            Action::Install(selection.clone())
        } else {
            Action::Interactive
        }
    }

    /// Run-time overrides for path resolution.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            config_path: self.config.clone(),
            install_dir: Some(self.install_dir.clone()),
            force: self.force,
            verbose: self.verbose,
        }
    }
}

//! Top-level command orchestration over the engine.
pub mod install;
pub mod interactive;
pub mod status;
pub mod uninstall;

use anyhow::{Context as _, Result};
use std::io::{self, Write as _};

use crate::cli::{Action, Cli};
use crate::config::Config;
use crate::engine::context::expand_tilde;
use crate::engine::{ExecutionContext, RunOptions};
use crate::logging::console;

/// Shared state produced by the common command setup sequence.
///
/// Loads the configuration, reports its warnings and resolves the execution
/// context so that each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded configuration.
    pub config: Config,
    /// Resolved execution context.
    pub ctx: ExecutionContext,
}

impl CommandSetup {
    /// Load the configuration and resolve every path of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or validated,
    /// or its paths cannot be resolved.
    pub fn init(options: &RunOptions) -> Result<Self> {
        let config_path = expand_tilde(&options.config_path)?;
        let config = Config::load(&config_path).context("Error loading config")?;
        let ctx = ExecutionContext::resolve(&config, options)?;

        let warnings = config.warnings(&ctx.config_dir);
        if !warnings.is_empty() {
            console::warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                console::warn(&format!("  {warning}"));
            }
        }

        Ok(Self { config, ctx })
    }
}

/// Run the command selected by `cli`.
///
/// # Errors
///
/// Returns an error for every condition that should end the process with a
/// non-zero exit code.
pub fn dispatch(cli: &Cli) -> Result<()> {
    let setup = CommandSetup::init(&cli.run_options())?;
    match cli.action() {
        Action::List => status::run_list(&setup),
        Action::Status => status::run_status(&setup),
        Action::Uninstall(selection) => uninstall::run(&setup, selection.as_deref()),
        Action::Install(selection) => install::run(setup, &selection),
        Action::Interactive => interactive::run(setup),
    }
}

/// Write `text` to stdout as-is.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn emit(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .context("writing to stdout")
}

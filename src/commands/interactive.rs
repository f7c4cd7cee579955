//! Interactive install/uninstall manager.
use anyhow::{Context as _, Result};
use std::io::{self, BufRead};

use super::{CommandSetup, emit, install, status, uninstall};
use crate::config::{Config, Module};
use crate::engine::status::{installed_modules, prepare_status_backup};
use crate::engine::{ExecutionContext, ensure_install_dir};
use crate::logging::console;

/// One line typed at the manager prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `i <selection>`
    Install(String),
    /// `u <selection>`
    Uninstall(String),
    /// `q`
    Quit,
    /// Blank line
    Empty,
    /// Anything else, carrying the command word
    Unknown(String),
}

/// Parse a manager prompt line.
#[must_use]
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let (word, args) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, a)| (w, a.trim()));
    match word.to_lowercase().as_str() {
        "q" => Command::Quit,
        "i" => Command::Install(args.to_string()),
        "u" => Command::Uninstall(args.to_string()),
        other => Command::Unknown(other.to_string()),
    }
}

/// Resolve a selection typed at the prompt.
///
/// Accepts `all`, or 1-based indices and module names separated by commas
/// or whitespace. Duplicates collapse; order follows the input.
///
/// # Errors
///
/// Returns a message for an empty selection, an index out of range, or an
/// unknown name.
pub fn parse_selection<'a>(
    args: &str,
    config: &'a Config,
) -> Result<Vec<(&'a str, &'a Module)>, String> {
    let args = args.trim();
    if args.is_empty() {
        return Err("Please specify module number(s) or name(s).".to_string());
    }
    if args.eq_ignore_ascii_case("all") {
        return Ok(config
            .modules
            .iter()
            .map(|(name, module)| (name.as_str(), module))
            .collect());
    }

    let mut selected: Vec<(&str, &Module)> = Vec::new();
    for part in args
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
    {
        let entry = if part.chars().all(|c| c.is_ascii_digit()) {
            part.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| config.modules.get_index(idx))
                .ok_or_else(|| format!("Invalid number: {part}"))?
        } else {
            config
                .modules
                .get_key_value(part)
                .ok_or_else(|| format!("Unknown module: {part}"))?
        };
        if !selected.iter().any(|(n, _)| *n == entry.0.as_str()) {
            selected.push((entry.0.as_str(), entry.1));
        }
    }
    Ok(selected)
}

/// Prepare the install directory and run the manager on stdin.
///
/// Ctrl-C exits the process with status 0.
///
/// # Errors
///
/// Returns an error if the install directory cannot be prepared, or stdin
/// or stdout fail.
pub fn run(setup: CommandSetup) -> Result<()> {
    let CommandSetup { config, mut ctx } = setup;
    ensure_install_dir(&ctx.install_dir).context("Failed to prepare install dir")?;

    install_interrupt_handler();

    let stdin = io::stdin();
    manage(&config, &mut ctx, &mut stdin.lock())
}

/// Exit with status 0 on Ctrl-C. Returns whether the handler was installed.
fn install_interrupt_handler() -> bool {
    match ctrlc::set_handler(|| {
        console::progress("\nExiting.");
        std::process::exit(0);
    }) {
        Ok(()) => true,
        Err(e) => {
            console::warn(&format!("Ctrl-C will not exit cleanly: {e}"));
            false
        }
    }
}

/// Show the manager table and act on commands read from `input` until `q`
/// or end of input.
///
/// # Errors
///
/// Returns an error if `input` or stdout fail, or the status ledger cannot
/// be written.
pub fn manage(config: &Config, ctx: &mut ExecutionContext, input: &mut impl BufRead) -> Result<()> {
    loop {
        let installed = installed_modules(config, ctx);
        emit(&status::render_manager(config, &installed, &ctx.install_dir))?;

        let Some(line) = prompt(input, "Enter command: ")? else {
            return emit("\nExiting.\n");
        };
        let is_installed = |name: &str| installed.get(name).copied().unwrap_or(false);

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => return emit("Goodbye!\n"),
            Command::Unknown(word) => {
                console::warn(&format!("Unknown command: {word}. Use 'i', 'u', or 'q'."));
            }
            Command::Install(args) => {
                let selected = match parse_selection(&args, config) {
                    Ok(selected) => selected,
                    Err(msg) => {
                        console::warn(&msg);
                        continue;
                    }
                };
                let to_install: Vec<(&str, &Module)> = selected
                    .into_iter()
                    .filter(|(name, _)| !is_installed(name))
                    .collect();
                if to_install.is_empty() {
                    console::progress("All selected modules are already installed.");
                    continue;
                }
                prepare_status_backup(ctx)?;
                install::install_selected(&to_install, ctx)?;
            }
            Command::Uninstall(args) => {
                let selected = match parse_selection(&args, config) {
                    Ok(selected) => selected,
                    Err(msg) => {
                        console::warn(&msg);
                        continue;
                    }
                };
                let to_uninstall: Vec<(&str, &Module)> = selected
                    .into_iter()
                    .filter(|(name, _)| is_installed(name))
                    .collect();
                if to_uninstall.is_empty() {
                    console::progress("None of the selected modules are installed.");
                    continue;
                }
                let names: Vec<&str> = to_uninstall.iter().map(|(name, _)| *name).collect();
                emit(&format!("\nUninstalling: {}\n", names.join(", ")))?;
                let confirmed = prompt(input, "Confirm? (y/N): ")?
                    .is_some_and(|answer| answer.eq_ignore_ascii_case("y"));
                if confirmed {
                    uninstall::uninstall_selected(&to_uninstall, ctx)?;
                } else {
                    console::progress("Cancelled.");
                }
            }
        }
    }
}

/// Print `text` and read one trimmed line, or `None` at end of input.
fn prompt(input: &mut impl BufRead, text: &str) -> Result<Option<String>> {
    emit(text)?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading from stdin")?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

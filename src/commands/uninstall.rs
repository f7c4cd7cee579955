//! Uninstall command implementation.
use anyhow::{Result, bail};

use super::CommandSetup;
use crate::config::{Module, select_modules};
use crate::engine::status::{read_status, remove_modules};
use crate::engine::{ExecutionContext, uninstall_module};
use crate::logging::console;

/// Run the uninstall command.
///
/// Only modules present in the status ledger are uninstalled.
///
/// # Errors
///
/// Returns an error if no selection was given, the selection names an
/// unknown module, or the status ledger cannot be parsed or written.
pub fn run(setup: &CommandSetup, selection: Option<&str>) -> Result<()> {
    let Some(selection) = selection.filter(|s| !s.trim().is_empty()) else {
        bail!("--uninstall requires --module to specify which modules to uninstall");
    };
    let ledger = read_status(&setup.ctx.status_file)?;
    let to_uninstall: Vec<(&str, &Module)> = select_modules(&setup.config, selection)?
        .into_iter()
        .filter(|(name, _)| ledger.modules.contains_key(*name))
        .collect();

    if to_uninstall.is_empty() {
        console::progress("None of the specified modules are installed.");
        return Ok(());
    }
    uninstall_selected(&to_uninstall, &setup.ctx)
}

/// Uninstall `selected` and drop them from the status ledger.
///
/// # Errors
///
/// Returns an error if the status ledger cannot be written.
pub fn uninstall_selected(selected: &[(&str, &Module)], ctx: &ExecutionContext) -> Result<()> {
    let names: Vec<&str> = selected.iter().map(|(name, _)| *name).collect();
    console::stage(&format!(
        "Uninstalling {} module(s): {}",
        names.len(),
        names.join(", ")
    ));

    for &(name, module) in selected {
        let record = uninstall_module(name, module, ctx);
        let removed = record.removed_paths.len();
        if record.hooks_removed {
            console::progress(&format!("  ✓ {name} uninstalled ({removed} path(s) removed)"));
        } else {
            console::warn(&format!("  ✗ {name} uninstalled, hooks left in settings"));
        }
    }

    remove_modules(ctx, &names)?;
    console::progress("\n✓ Uninstall complete");
    Ok(())
}

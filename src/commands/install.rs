//! Install command implementation.
use anyhow::{Context as _, Result, bail};

use super::CommandSetup;
use crate::config::{Module, select_modules};
use crate::engine::status::{prepare_status_backup, read_status, record_results};
use crate::engine::{BatchReport, ExecutionContext, ensure_install_dir, install_modules};
use crate::logging::console;

/// Run the install command for `selection`.
///
/// # Errors
///
/// Returns an error if the selection names an unknown module, the install
/// directory cannot be prepared, the status ledger cannot be parsed or
/// written, or a module failed without `--force`.
pub fn run(setup: CommandSetup, selection: &str) -> Result<()> {
    let CommandSetup { config, mut ctx } = setup;
    let selected = select_modules(&config, selection)?;
    read_status(&ctx.status_file)?;

    ensure_install_dir(&ctx.install_dir).context("Failed to prepare install dir")?;
    prepare_status_backup(&mut ctx)?;

    let report = install_selected(&selected, &mut ctx)?;
    let failed = report.failure_count();
    if failed > 0 && !ctx.force {
        bail!("{failed} module(s) failed");
    }
    Ok(())
}

/// Install `selected`, write the successful results to the ledger and print
/// the summary.
///
/// # Errors
///
/// Returns an error if the status ledger cannot be written.
pub fn install_selected(
    selected: &[(&str, &Module)],
    ctx: &mut ExecutionContext,
) -> Result<BatchReport> {
    console::stage(&format!(
        "Installing {} module(s) to {}...",
        selected.len(),
        ctx.install_dir.display()
    ));
    let report = install_modules(selected, ctx);
    record_results(ctx, &report.results)?;
    print_summary(&report, ctx);
    Ok(report)
}

fn print_summary(report: &BatchReport, ctx: &ExecutionContext) {
    let (success, failed) = (report.success_count(), report.failure_count());
    if failed == 0 {
        console::progress(&format!(
            "\n✓ Installation complete: {success} module(s) installed"
        ));
        console::progress(&format!("  Log file: {}", ctx.log_file.display()));
    } else {
        console::warn(&format!(
            "⚠ Installation finished with errors: {success} success, {failed} failed"
        ));
        console::warn(&format!(
            "  Check log file for details: {}",
            ctx.log_file.display()
        ));
    }
}

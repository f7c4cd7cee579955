//! Best-effort reversal of the paths a failed module created.
use std::fs;
use std::io;
use std::path::PathBuf;

use super::context::ExecutionContext;
use crate::error::RollbackError;
use crate::resources::fs::{is_strictly_inside, remove_path};

/// What a rollback managed to undo.
#[derive(Debug, Default)]
pub struct RollbackReport {
    /// Paths removed, in removal order.
    pub removed: Vec<PathBuf>,
    /// Paths that could not be removed.
    pub errors: Vec<RollbackError>,
    /// Whether the status ledger was restored from its backup.
    pub status_restored: bool,
}

/// Undo every path recorded on `ctx` after `mark`, newest first, then
/// restore the status ledger from its backup when one was taken.
///
/// Only paths strictly inside the install directory are touched. A path that
/// no longer exists is not an error; any other removal failure is logged as
/// `ERROR` and the remaining paths are still processed. The rolled-back
/// paths are dropped from the context.
pub fn rollback(ctx: &mut ExecutionContext, mark: usize) -> RollbackReport {
    ctx.log.warning("Rolling back installation");
    let mut report = RollbackReport::default();

    for path in ctx.take_applied_since(mark).into_iter().rev() {
        if !is_strictly_inside(&path, &ctx.install_dir) {
            continue;
        }
        match remove_path(&path) {
            Ok(()) => report.removed.push(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                let err = RollbackError { path, source };
                ctx.log.error(&err.to_string());
                report.errors.push(err);
            }
        }
    }

    if let Some(backup) = ctx.status_backup.as_ref().filter(|b| b.is_file()) {
        match fs::copy(backup, &ctx.status_file) {
            Ok(_) => report.status_restored = true,
            Err(e) => ctx.log.error(&format!(
                "Failed to restore {} from {}: {e}",
                ctx.status_file.display(),
                backup.display()
            )),
        }
    }

    ctx.log.info("Rollback completed");
    report
}

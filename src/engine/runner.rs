//! Module runner: operations, then hooks, then a result record per module.
use std::fs;
use std::path::{Path, PathBuf};

use super::context::ExecutionContext;
use super::hooks::{find_module_hooks, merge_hooks_to_settings, unmerge_hooks_from_settings};
use super::operations::execute_operation;
use super::rollback::{RollbackReport, rollback};
use super::status::{ModuleRecord, OperationRecord, RunStatus};
use crate::config::{Module, Operation};
use crate::error::{OperationError, PathError};
use crate::logging::{console, iso_timestamp};
use crate::resources::copy::{CopyDirResource, CopyFileResource};
use crate::resources::fs::is_strictly_inside;
use crate::resources::{Applicable, ResourceChange};

/// Operation kind recorded for the hook-merge step.
const MERGE_HOOKS: &str = "merge_hooks";

/// Probe file used to check that the install directory is writable.
const WRITE_PROBE: &str = ".modinstall-write-test";

/// The first operation of a module that failed.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ModuleFailure {
    /// Kind of the failing operation.
    pub operation: &'static str,
    /// The operation's error.
    #[source]
    pub error: OperationError,
}

/// Apply every operation of `module` in order, then merge its hooks.
///
/// The first failing operation stops the module and is logged as `ERROR`.
/// A hook-merge failure is logged as `WARNING` and recorded in the returned
/// record without failing the module.
///
/// # Errors
///
/// Returns a [`ModuleFailure`] naming the first operation that failed.
pub fn execute_module(
    name: &str,
    module: &Module,
    ctx: &mut ExecutionContext,
) -> Result<ModuleRecord, ModuleFailure> {
    let mut record = ModuleRecord::new(name, RunStatus::Success);

    for op in &module.operations {
        if let Err(error) = execute_operation(op, ctx) {
            ctx.log
                .error(&format!("Module {name} failed on {}: {error}", op.kind()));
            return Err(ModuleFailure {
                operation: op.kind(),
                error,
            });
        }
        record.operations.push(OperationRecord::success(op.kind()));
    }

    if let Some(hooks) = find_module_hooks(module, ctx) {
        record.has_hooks = Some(true);
        match merge_hooks_to_settings(name, &hooks, ctx) {
            Ok(()) => record.operations.push(OperationRecord::success(MERGE_HOOKS)),
            Err(e) => {
                ctx.log
                    .warning(&format!("Failed to merge hooks for {name}: {e}"));
                record
                    .operations
                    .push(OperationRecord::failed(MERGE_HOOKS, e.to_string()));
            }
        }
    }

    Ok(record)
}

/// Outcome of installing a batch of modules.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One record per attempted module, in order.
    pub results: Vec<ModuleRecord>,
    /// Set when a failure stopped the batch before every module was tried.
    pub aborted: bool,
    /// One rollback per failed module, in order.
    pub rollbacks: Vec<RollbackReport>,
}

impl BatchReport {
    /// Number of modules that installed successfully.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of modules that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

/// Install `selected` modules in order.
///
/// Each module's newly-created paths are rolled back when it fails. Without
/// `force` the batch then stops; with `force` the failure is recorded and the
/// next module runs. Earlier successful modules are never rolled back.
pub fn install_modules(selected: &[(&str, &Module)], ctx: &mut ExecutionContext) -> BatchReport {
    let total = selected.len();
    let mut report = BatchReport::default();

    for (idx, &(name, module)) in selected.iter().enumerate() {
        console::progress(&format!("[{}/{total}] Installing module: {name}...", idx + 1));
        let mark = ctx.applied_mark();
        match execute_module(name, module, ctx) {
            Ok(record) => {
                console::progress(&format!("  ✓ {name} installed successfully"));
                report.results.push(record);
            }
            Err(failure) => {
                console::failure(&format!("  ✗ {name} failed: {failure}"));
                let undone = rollback(ctx, mark);
                print_rollback(name, &undone);
                report.rollbacks.push(undone);
                let mut record = ModuleRecord::new(name, RunStatus::Failed);
                record.operations.push(OperationRecord::failed(
                    failure.operation,
                    failure.error.to_string(),
                ));
                report.results.push(record);
                if !ctx.force {
                    report.aborted = true;
                    break;
                }
            }
        }
    }
    report
}

fn print_rollback(name: &str, undone: &RollbackReport) {
    console::progress(&format!(
        "  ↺ Rolled back {} path(s) created by {name}",
        undone.removed.len()
    ));
    if undone.status_restored {
        console::progress("  ↺ Status ledger restored from backup");
    }
    if !undone.errors.is_empty() {
        console::warn(&format!(
            "  {} path(s) could not be removed, see the log file",
            undone.errors.len()
        ));
    }
}

/// Result of uninstalling one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallRecord {
    /// Module name.
    pub module: String,
    /// Always [`RunStatus::Success`]; per-path failures are only logged.
    pub status: RunStatus,
    /// When the module was uninstalled.
    pub uninstalled_at: String,
    /// Targets that were removed.
    pub removed_paths: Vec<PathBuf>,
    /// Whether the module's hooks were unmerged from the settings document.
    pub hooks_removed: bool,
}

/// Remove every existing `copy_dir`/`copy_file` target of `module`, then its
/// hooks.
///
/// `merge_dir`, `merge_json` and `run_command` effects are left in place.
/// Failures are logged as `WARNING` and do not stop the remaining steps.
pub fn uninstall_module(name: &str, module: &Module, ctx: &ExecutionContext) -> UninstallRecord {
    let mut removed_paths = Vec::new();

    for op in &module.operations {
        let Some(target) = op.copy_target().map(|t| ctx.target_path(t)) else {
            continue;
        };
        if !is_strictly_inside(&target, &ctx.install_dir) {
            ctx.log.warning(&format!(
                "Not removing {}: outside the install directory",
                target.display()
            ));
            continue;
        }
        let resource: Box<dyn Applicable> = match op {
            Operation::CopyDir { source, .. } => Box::new(CopyDirResource::new(
                ctx.source_path(Path::new(source)),
                target.clone(),
                false,
            )),
            Operation::CopyFile { source, .. } => Box::new(CopyFileResource::new(
                ctx.source_path(Path::new(source)),
                target.clone(),
                false,
            )),
            Operation::MergeDir { .. }
            | Operation::MergeJson { .. }
            | Operation::RunCommand { .. } => continue,
        };
        match resource.remove() {
            Ok(ResourceChange::Applied) => {
                ctx.log.info(&format!("Removed: {}", target.display()));
                removed_paths.push(target);
            }
            Ok(ResourceChange::AlreadyCorrect | ResourceChange::Skipped { .. }) => {}
            Err(e) => ctx
                .log
                .warning(&format!("Failed to remove {}: {e:#}", target.display())),
        }
    }

    let hooks_removed = match unmerge_hooks_from_settings(name, ctx) {
        Ok(()) => true,
        Err(e) => {
            ctx.log
                .warning(&format!("Failed to remove hooks for {name}: {e}"));
            false
        }
    };

    UninstallRecord {
        module: name.to_string(),
        status: RunStatus::Success,
        uninstalled_at: iso_timestamp(),
        removed_paths,
        hooks_removed,
    }
}

/// Make sure `path` is a writable directory, creating it if needed.
///
/// # Errors
///
/// Returns [`PathError::NotADirectory`] if `path` exists as something else,
/// [`PathError::Create`] if it cannot be created, and
/// [`PathError::NotWritable`] if a file cannot be written inside it.
pub fn ensure_install_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() && !path.is_dir() {
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|source| PathError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let probe = path.join(WRITE_PROBE);
    fs::write(&probe, b"").map_err(|_| PathError::NotWritable(path.to_path_buf()))?;
    if let Err(e) = fs::remove_file(&probe) {
        console::warn(&format!("Could not remove {}: {e}", probe.display()));
    }
    Ok(())
}

//! Module execution and reversal engine.
//!
//! - **[`context`]** resolves paths and carries the per-run applied-paths ledger
//! - **[`operations`]** applies one configured operation
//! - **[`hooks`]** discovers hook declarations and merges them into settings
//! - **[`status`]** persists which modules are installed
//! - **[`rollback`]** undoes the paths a failed module created
//! - **[`runner`]** drives a module, or a batch of modules, end to end
pub mod context;
pub mod hooks;
pub mod operations;
pub mod rollback;
pub mod runner;
pub mod status;

pub use context::{ExecutionContext, RunOptions};
pub use runner::{
    BatchReport, ModuleFailure, UninstallRecord, ensure_install_dir, execute_module,
    install_modules, uninstall_module,
};
pub use status::{InstallationStatus, LedgerEntry, ModuleRecord, OperationRecord, RunStatus};

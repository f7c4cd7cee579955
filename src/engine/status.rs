//! Status ledger: which modules are installed and how their last run went.
use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use super::context::ExecutionContext;
use crate::config::{Config, Module};
use crate::logging::iso_timestamp;
use crate::resources::json::save_json;

/// Outcome of a module or one of its operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Completed without error.
    Success,
    /// Stopped by an error.
    Failed,
}

/// Outcome of a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation kind (`copy_dir`, ..., or `merge_hooks`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the operation succeeded.
    pub status: RunStatus,
    /// Error message, when the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationRecord {
    /// A successful operation of `kind`.
    #[must_use]
    pub fn success(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status: RunStatus::Success,
            error: None,
        }
    }

    /// A failed operation of `kind`.
    #[must_use]
    pub fn failed(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status: RunStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// The result of installing one module, as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Module name.
    pub module: String,
    /// Overall module status.
    pub status: RunStatus,
    /// Per-operation outcomes, in execution order.
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
    /// When the module was installed.
    #[serde(default)]
    pub installed_at: String,
    /// Set when hook declarations were found for the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_hooks: Option<bool>,
    /// Fields written by other installer versions, kept as they were.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModuleRecord {
    /// An empty record for `module` stamped with the current time.
    #[must_use]
    pub fn new(module: &str, status: RunStatus) -> Self {
        Self {
            module: module.to_string(),
            status,
            operations: Vec::new(),
            installed_at: iso_timestamp(),
            has_hooks: None,
            extra: Map::new(),
        }
    }

    /// Whether the module succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success)
    }
}

/// One entry of the ledger's `modules` map.
///
/// Entries that do not match [`ModuleRecord`] are kept verbatim so that
/// rewriting the ledger never loses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerEntry {
    /// An entry in the current record format.
    Record(ModuleRecord),
    /// Any other JSON value.
    Unrecognized(Value),
}

impl LedgerEntry {
    /// The entry's `installed_at` stamp, if it has one.
    #[must_use]
    pub fn installed_at(&self) -> Option<&str> {
        match self {
            Self::Record(record) => Some(record.installed_at.as_str()),
            Self::Unrecognized(value) => value.get("installed_at").and_then(Value::as_str),
        }
    }
}

impl From<ModuleRecord> for LedgerEntry {
    fn from(record: ModuleRecord) -> Self {
        Self::Record(record)
    }
}

/// The persisted ledger document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationStatus {
    /// When the ledger was first written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,
    /// When the ledger was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Installed modules by name.
    #[serde(default)]
    pub modules: IndexMap<String, LedgerEntry>,
    /// Top-level fields written by other installer versions.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstallationStatus {
    /// Overlay the successful records of `results`, leaving every other entry
    /// alone, and stamp `updated_at`.
    pub fn overlay(&mut self, results: &[ModuleRecord]) {
        for record in results.iter().filter(|r| r.is_success()) {
            self.modules
                .insert(record.module.clone(), LedgerEntry::Record(record.clone()));
        }
        self.touch();
    }

    /// Drop exactly the named modules and stamp `updated_at`.
    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.modules.shift_remove(name.as_ref());
        }
        self.touch();
    }

    fn touch(&mut self) {
        let now = iso_timestamp();
        if self.installed_at.is_none() {
            self.installed_at = Some(now.clone());
        }
        self.updated_at = Some(now);
    }
}

/// Read the ledger at `path`. A missing ledger reads as empty.
///
/// # Errors
///
/// Returns an error if the ledger exists but cannot be read, is not valid
/// JSON, or its top level does not have the ledger's shape.
pub fn read_status(path: &Path) -> Result<InstallationStatus> {
    if !path.exists() {
        return Ok(InstallationStatus::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Status ledger {} is malformed", path.display()))
}

/// Load the ledger at `path` for display.
///
/// An unreadable or malformed ledger reads as empty.
#[must_use]
pub fn load_status(path: &Path) -> InstallationStatus {
    read_status(path).unwrap_or_default()
}

/// Write the ledger to `path`.
///
/// # Errors
///
/// Returns an error if the ledger cannot be serialized or written.
pub fn save_status(path: &Path, status: &InstallationStatus) -> Result<()> {
    let value = serde_json::to_value(status).context("serializing status ledger")?;
    save_json(path, &value)
}

/// Whether `module` counts as installed: present in the ledger, or one of its
/// `copy_dir`/`copy_file` targets exists on disk.
#[must_use]
pub fn is_module_installed(
    name: &str,
    module: &Module,
    status: &InstallationStatus,
    ctx: &ExecutionContext,
) -> bool {
    status.modules.contains_key(name)
        || module
            .operations
            .iter()
            .filter_map(|op| op.copy_target())
            .any(|target| ctx.target_path(target).exists())
}

/// Installed state of every configured module, in configuration order.
#[must_use]
pub fn installed_modules(config: &Config, ctx: &ExecutionContext) -> IndexMap<String, bool> {
    let status = load_status(&ctx.status_file);
    config
        .modules
        .iter()
        .map(|(name, module)| (name.clone(), is_module_installed(name, module, &status, ctx)))
        .collect()
}

/// Copy the ledger to its backup path before a run, if a ledger exists.
///
/// # Errors
///
/// Returns an error if the ledger exists but cannot be copied.
pub fn prepare_status_backup(ctx: &mut ExecutionContext) -> Result<()> {
    if !ctx.status_file.is_file() {
        return Ok(());
    }
    let backup = ctx.status_backup_file();
    fs::copy(&ctx.status_file, &backup).with_context(|| {
        format!(
            "backing up {} to {}",
            ctx.status_file.display(),
            backup.display()
        )
    })?;
    ctx.status_backup = Some(backup);
    Ok(())
}

/// Reload the ledger, overlay the successful `results` and write it back.
///
/// # Errors
///
/// Returns an error if the existing ledger cannot be parsed (it is then left
/// untouched) or the ledger cannot be written.
pub fn record_results(ctx: &ExecutionContext, results: &[ModuleRecord]) -> Result<()> {
    let mut status = read_status(&ctx.status_file)?;
    status.overlay(results);
    save_status(&ctx.status_file, &status)
}

/// Reload the ledger, drop the named modules and write it back.
///
/// # Errors
///
/// Returns an error if the existing ledger cannot be parsed (it is then left
/// untouched) or the ledger cannot be written.
pub fn remove_modules<S: AsRef<str>>(ctx: &ExecutionContext, names: &[S]) -> Result<()> {
    let mut status = read_status(&ctx.status_file)?;
    status.remove(names);
    save_status(&ctx.status_file, &status)
}

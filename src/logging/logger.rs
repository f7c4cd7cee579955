//! Install-log writer with console mirroring.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::types::{Level, LogEntry};
use super::utils::iso_timestamp;

/// Tracing target for log-file entries mirrored to the console.
///
/// The console layer only shows events with this target when verbose output
/// is enabled.
pub const ENTRY_TARGET: &str = "modinstall::entry";

/// Tracing target for stage headers.
pub const STAGE_TARGET: &str = "modinstall::stage";

/// Emit `$entry` as a tracing event at the given level, carrying the captured
/// command output as structured fields.
macro_rules! mirror_entry {
    ($level:expr, $entry:expr) => {
        tracing::event!(
            target: ENTRY_TARGET,
            $level,
            stdout = $entry.stdout.as_deref().unwrap_or_default(),
            stderr = $entry.stderr.as_deref().unwrap_or_default(),
            returncode = $entry.returncode.map(i64::from),
            "{}",
            $entry.message
        )
    };
}

/// Appends [`LogEntry`] records to the install log and mirrors them to the
/// console.
///
/// The log file and its parent directory are created on the first write.
/// The file is only ever opened in append mode, so successive runs against
/// the same install directory accumulate in one log.
#[derive(Debug, Clone)]
pub struct Logger {
    log_file: PathBuf,
}

impl Logger {
    /// Create a logger that appends to `log_file`.
    #[must_use]
    pub const fn new(log_file: PathBuf) -> Self {
        Self { log_file }
    }

    /// Path of the install log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.log_file
    }

    /// Append `entry` to the install log and mirror it to the console.
    ///
    /// A write failure is reported on the console but never propagated: the
    /// log is an audit trail and must not fail the operation it describes.
    pub fn write(&self, entry: &LogEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!("cannot write log {}: {e:#}", self.log_file.display());
        }
        match entry.level {
            Level::Info => mirror_entry!(tracing::Level::INFO, entry),
            Level::Warning => mirror_entry!(tracing::Level::WARN, entry),
            Level::Error => mirror_entry!(tracing::Level::ERROR, entry),
        }
    }

    fn append(&self, entry: &LogEntry) -> anyhow::Result<()> {
        if let Some(parent) = self.log_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;
        file.write_all(entry.render(&iso_timestamp()).as_bytes())?;
        Ok(())
    }

    /// Append an `INFO` entry.
    pub fn info(&self, msg: &str) {
        self.write(&LogEntry::info(msg));
    }

    /// Append a `WARNING` entry.
    pub fn warning(&self, msg: &str) {
        self.write(&LogEntry::warning(msg));
    }

    /// Append an `ERROR` entry.
    pub fn error(&self, msg: &str) {
        self.write(&LogEntry::error(msg));
    }
}

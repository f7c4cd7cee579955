//! Core logging types: log-file entries and their severity.
use std::fmt;

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Normal progress (an operation was applied or skipped).
    Info,
    /// Recoverable problem (hook merge failure, rollback notice).
    Warning,
    /// Failure of an operation or of an individual rollback step.
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One record appended to the install log file.
///
/// Command operations attach the captured output of the subprocess, which is
/// rendered as indented continuation lines below the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity.
    pub level: Level,
    /// Human-readable message.
    pub message: String,
    /// Captured standard output of a command.
    pub stdout: Option<String>,
    /// Captured standard error of a command.
    pub stderr: Option<String>,
    /// Exit code of a command.
    pub returncode: Option<i32>,
}

impl LogEntry {
    /// Create an entry without captured command output.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            stdout: None,
            stderr: None,
            returncode: None,
        }
    }

    /// Create an `INFO` entry.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// Create a `WARNING` entry.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Create an `ERROR` entry.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Attach captured command output.
    #[must_use]
    pub fn with_output(mut self, stdout: String, stderr: String, returncode: i32) -> Self {
        self.stdout = Some(stdout);
        self.stderr = Some(stderr);
        self.returncode = Some(returncode);
        self
    }

    /// Render the entry as log-file lines, each terminated by a newline.
    ///
    /// Empty `stdout`/`stderr` captures are omitted; a return code is always
    /// written when present, including `0`.
    #[must_use]
    pub fn render(&self, timestamp: &str) -> String {
        let mut out = format!("[{timestamp}] {}: {}\n", self.level, self.message);
        for (key, value) in [("stdout", &self.stdout), ("stderr", &self.stderr)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                out.push_str(&format!("  {key}: {value}\n"));
            }
        }
        if let Some(code) = self.returncode {
            out.push_str(&format!("  returncode: {code}\n"));
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn level_display_matches_log_format() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn render_plain_entry() {
        let entry = LogEntry::info("Copied dir a -> b");
        assert_eq!(
            entry.render("2026-01-01T00:00:00.000000"),
            "[2026-01-01T00:00:00.000000] INFO: Copied dir a -> b\n"
        );
    }

    #[test]
    fn render_command_entry_with_output() {
        let entry = LogEntry::info("Command: echo hi").with_output(
            "hi\n".to_string(),
            String::new(),
            0,
        );
        let rendered = entry.render("ts");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "[ts] INFO: Command: echo hi");
        assert_eq!(lines[1], "  stdout: hi");
        assert_eq!(lines[2], "  returncode: 0");
        assert!(!rendered.contains("stderr"), "empty stderr is omitted");
    }

    #[test]
    fn warning_and_error_constructors_set_level() {
        assert_eq!(LogEntry::warning("w").level, Level::Warning);
        assert_eq!(LogEntry::error("e").level, Level::Error);
    }
}

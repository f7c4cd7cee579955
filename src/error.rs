//! Domain-specific error types for the installer engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Engine modules return typed errors (e.g., [`ConfigError`], [`OperationError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! InstallerError
//! ├── Config(ConfigError)       malformed or missing configuration (fatal)
//! ├── Path(PathError)           unusable install directory (fatal)
//! ├── Operation(OperationError) a module operation failed (triggers rollback)
//! ├── HookMerge(HookMergeError) hooks could not be merged (logged, non-fatal)
//! └── Rollback(RollbackError)   a path could not be removed during rollback
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the installer engine.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Install directory could not be prepared.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// A module operation failed.
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Hooks could not be merged into the settings document.
    #[error("Hook merge error: {0}")]
    HookMerge(#[from] HookMergeError),

    /// A path could not be removed during rollback.
    #[error("Rollback error: {0}")]
    Rollback(#[from] RollbackError),
}

/// Errors that arise from loading and validating the configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("File not found: {path}")]
    NotFound {
        /// Path of the missing file.
        path: PathBuf,
    },

    /// The configuration file is not valid JSON or does not match the
    /// expected document shape.
    #[error("Invalid JSON in {path}: {message}")]
    Invalid {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Structural validation found one or more hard errors.
    #[error("Config validation failed: {0}")]
    Validation(String),

    /// A module named on the command line is not defined.
    #[error("Module '{0}' not found")]
    UnknownModule(String),
}

/// Errors that arise while preparing the install directory.
#[derive(Error, Debug)]
pub enum PathError {
    /// The install path exists but is not a directory.
    #[error("Install path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The install directory is not writable.
    #[error("No write permission for install dir: {0}")]
    NotWritable(PathBuf),

    /// The install directory could not be created.
    #[error("Failed to create install dir {path}: {source}")]
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that fail the current module and trigger rollback.
#[derive(Error, Debug)]
pub enum OperationError {
    /// A declared source path does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// A shell command exited with a non-zero status.
    #[error("Command failed with code {code}: {command}")]
    CommandFailed {
        /// The command as executed.
        command: String,
        /// Exit code (`-1` when the process was terminated by a signal).
        code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Any other failure while applying an operation (I/O, JSON parsing).
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Errors that arise while merging hooks into the settings document.
#[derive(Error, Debug)]
pub enum HookMergeError {
    /// The settings document exists but its `hooks` field is not an object.
    #[error("settings hooks field is not an object")]
    MalformedSettings,

    /// A hook type in the module's hooks file does not map to a list.
    #[error("hook type '{0}' is not a list")]
    MalformedHooks(String),

    /// The settings document could not be read back or written.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// An individual path deletion failure during rollback.
#[derive(Error, Debug)]
#[error("Rollback skipped {path}: {source}")]
pub struct RollbackError {
    /// Path that could not be removed.
    pub path: PathBuf,
    /// Underlying I/O error.
    pub source: std::io::Error,
}

//! The operation kinds a module can declare.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One declarative action of a module.
///
/// Sources are relative to the directory holding the configuration file;
/// targets are relative to the install directory.
///
/// # Examples
///
/// ```
/// use modinstall_cli::config::Operation;
///
/// let op: Operation = serde_json::from_str(
///     r#"{"type": "copy_dir", "source": "templates/tools", "target": "tools"}"#,
/// ).unwrap();
/// assert_eq!(op.kind(), "copy_dir");
/// assert_eq!(op.copy_target(), Some(std::path::Path::new("tools")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Copy a directory tree.
    CopyDir {
        /// Source directory.
        source: String,
        /// Target directory.
        target: String,
    },
    /// Copy a single file, preserving its metadata.
    CopyFile {
        /// Source file.
        source: String,
        /// Target file.
        target: String,
    },
    /// Merge every first-level bucket of `source` into the install directory.
    MergeDir {
        /// Source directory whose subdirectories are buckets.
        source: String,
    },
    /// Merge a JSON document into another, optionally under a dot path.
    MergeJson {
        /// Source JSON file.
        source: String,
        /// Target JSON file.
        target: String,
        /// Dot-separated key path to merge under (root when absent).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        merge_key: Option<String>,
    },
    /// Run a shell command in the configuration directory.
    RunCommand {
        /// Command line passed to the platform shell.
        command: String,
        /// Environment overrides; `${install_dir}` is substituted in values.
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        env: IndexMap<String, String>,
    },
}

impl Operation {
    /// The `type` tag of this operation as it appears in configuration.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CopyDir { .. } => "copy_dir",
            Self::CopyFile { .. } => "copy_file",
            Self::MergeDir { .. } => "merge_dir",
            Self::MergeJson { .. } => "merge_json",
            Self::RunCommand { .. } => "run_command",
        }
    }

    /// Target of a `copy_dir` or `copy_file` operation.
    ///
    /// These are the only targets a module exclusively owns, so they drive
    /// installed-state detection and uninstall.
    #[must_use]
    pub fn copy_target(&self) -> Option<&Path> {
        match self {
            Self::CopyDir { target, .. } | Self::CopyFile { target, .. } => {
                Some(Path::new(target))
            }
            _ => None,
        }
    }

    /// Source path, for every kind that reads from the config directory.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        match self {
            Self::CopyDir { source, .. }
            | Self::CopyFile { source, .. }
            | Self::MergeDir { source }
            | Self::MergeJson { source, .. } => Some(Path::new(source)),
            Self::RunCommand { .. } => None,
        }
    }

    /// Target path, for every kind that writes a single named target.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::CopyDir { target, .. }
            | Self::CopyFile { target, .. }
            | Self::MergeJson { target, .. } => Some(Path::new(target)),
            Self::MergeDir { .. } | Self::RunCommand { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CopyDir { source, target }
            | Self::CopyFile { source, target }
            | Self::MergeJson { source, target, .. } => {
                write!(f, "{} {source} -> {target}", self.kind())
            }
            Self::MergeDir { source } => write!(f, "merge_dir {source}"),
            Self::RunCommand { command, .. } => write!(f, "run_command {command}"),
        }
    }
}

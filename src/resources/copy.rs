//! Directory and file copy resources.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use crate::error::OperationError;

use super::fs::{copy_dir_recursive, copy_file_preserving, ensure_parent_dir, remove_path};
use super::{Applicable, ResourceChange};

/// Reason reported when an existing target is left alone.
const TARGET_EXISTS: &str = "target exists";

/// A directory tree copied into the install directory.
#[derive(Debug, Clone)]
pub struct CopyDirResource {
    /// Source directory.
    pub source: PathBuf,
    /// Target directory.
    pub target: PathBuf,
    /// Copy over an existing target instead of skipping it.
    pub force: bool,
}

impl CopyDirResource {
    /// Create a new directory copy resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, force: bool) -> Self {
        Self {
            source,
            target,
            force,
        }
    }
}

impl Applicable for CopyDirResource {
    fn description(&self) -> String {
        self.target.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.target.exists() && !self.force {
            return Ok(ResourceChange::Skipped {
                reason: TARGET_EXISTS.to_string(),
            });
        }
        if !self.source.is_dir() {
            return Err(OperationError::SourceNotFound(self.source.clone()).into());
        }
        ensure_parent_dir(&self.target)?;
        copy_dir_recursive(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        remove_target(&self.target)
    }
}

/// A single file copied into the install directory with its metadata.
#[derive(Debug, Clone)]
pub struct CopyFileResource {
    /// Source file.
    pub source: PathBuf,
    /// Target file.
    pub target: PathBuf,
    /// Copy over an existing target instead of skipping it.
    pub force: bool,
}

impl CopyFileResource {
    /// Create a new file copy resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, force: bool) -> Self {
        Self {
            source,
            target,
            force,
        }
    }
}

impl Applicable for CopyFileResource {
    fn description(&self) -> String {
        self.target.display().to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.target.exists() && !self.force {
            return Ok(ResourceChange::Skipped {
                reason: TARGET_EXISTS.to_string(),
            });
        }
        if !self.source.is_file() {
            return Err(OperationError::SourceNotFound(self.source.clone()).into());
        }
        ensure_parent_dir(&self.target)?;
        copy_file_preserving(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }

    fn remove(&self) -> Result<ResourceChange> {
        remove_target(&self.target)
    }
}

fn remove_target(target: &std::path::Path) -> Result<ResourceChange> {
    if target.symlink_metadata().is_err() {
        return Ok(ResourceChange::AlreadyCorrect);
    }
    remove_path(target).with_context(|| format!("removing {}", target.display()))?;
    Ok(ResourceChange::Applied)
}

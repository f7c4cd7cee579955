//! Bucket-wise merge of a source directory into the install directory.
use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OperationError;

use super::fs::copy_file_preserving;

/// Merges every first-level subdirectory ("bucket") of `source` into the
/// same-named directory under the install directory.
///
/// Only regular files directly inside a bucket are merged. Existing files are
/// kept unless `force` is set; nothing is ever deleted.
#[derive(Debug, Clone)]
pub struct MergeDirResource {
    /// Directory whose subdirectories are buckets.
    pub source: PathBuf,
    /// Install directory receiving the buckets.
    pub install_dir: PathBuf,
    /// Overwrite existing files.
    pub force: bool,
}

impl MergeDirResource {
    /// Create a new merge resource.
    #[must_use]
    pub const fn new(source: PathBuf, install_dir: PathBuf, force: bool) -> Self {
        Self {
            source,
            install_dir,
            force,
        }
    }

    /// Merge all buckets, returning the `bucket/file` names that were copied.
    ///
    /// Buckets and files are visited in name order.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::SourceNotFound`] if the source is not a
    /// directory, or an error if it cannot be read, a bucket directory
    /// cannot be created, or a file cannot be copied.
    pub fn merge(&self) -> Result<Vec<String>> {
        if !self.source.is_dir() {
            return Err(OperationError::SourceNotFound(self.source.clone()).into());
        }
        let mut merged = Vec::new();
        for bucket in sorted_entries(&self.source)? {
            if !bucket.is_dir() {
                continue;
            }
            let Some(bucket_name) = bucket.file_name() else {
                continue;
            };
            let target_bucket = self.install_dir.join(bucket_name);
            fs::create_dir_all(&target_bucket)
                .with_context(|| format!("creating directory {}", target_bucket.display()))?;

            for file in sorted_entries(&bucket)? {
                if !file.is_file() {
                    continue;
                }
                let Some(file_name) = file.file_name() else {
                    continue;
                };
                let dst = target_bucket.join(file_name);
                if dst.exists() && !self.force {
                    continue;
                }
                copy_file_preserving(&file, &dst)?;
                merged.push(format!(
                    "{}/{}",
                    bucket_name.to_string_lossy(),
                    file_name.to_string_lossy()
                ));
            }
        }
        Ok(merged)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("reading entry in {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

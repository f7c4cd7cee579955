//! Filesystem and JSON primitives applied by the operation executor.
//!
//! Nothing here logs or records rollback state; that is the engine's job.
pub mod copy;
pub mod fs;
pub mod json;
pub mod merge_dir;
pub mod settings;

use anyhow::Result;

/// A single install target that can be written and later taken away.
pub trait Applicable {
    /// Short label used in log lines, usually `source -> target`.
    fn description(&self) -> String;

    /// Write the target, creating missing parent directories.
    ///
    /// An existing target is reported as [`ResourceChange::Skipped`] unless
    /// the resource was built with overwrite enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or unreadable, or the
    /// target cannot be written.
    fn apply(&self) -> Result<ResourceChange>;

    /// Delete the target.
    ///
    /// Resources that cannot be undone keep this default, which fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be deleted, or the resource has
    /// no removal step.
    fn remove(&self) -> Result<ResourceChange> {
        anyhow::bail!("{} cannot be removed", self.description())
    }
}

/// Outcome of [`Applicable::apply`] or [`Applicable::remove`].
///
/// ```
/// use modinstall_cli::resources::ResourceChange;
///
/// let skipped = ResourceChange::Skipped { reason: "target exists".into() };
/// assert_ne!(skipped, ResourceChange::Applied);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The target was written or deleted.
    Applied,
    /// Nothing to do, such as removing a target that is already gone.
    AlreadyCorrect,
    /// The target exists and overwriting is off.
    Skipped {
        /// Shown in the log line.
        reason: String,
    },
}

//! User-facing console output that is not part of the install log.
//!
//! Everything here goes through [`tracing`] so the console formatter
//! installed by [`init_subscriber`](super::init_subscriber) decides colours
//! and the stdout/stderr split.
use super::logger::STAGE_TARGET;

/// Print a stage header.
pub fn stage(msg: &str) {
    tracing::info!(target: STAGE_TARGET, "{msg}");
}

/// Print a progress line on stdout.
pub fn progress(msg: &str) {
    tracing::info!("{msg}");
}

/// Print a warning line on stderr.
pub fn warn(msg: &str) {
    tracing::warn!("{msg}");
}

/// Print a failure line on stderr.
pub fn failure(msg: &str) {
    tracing::error!("{msg}");
}

//! Logging infrastructure: the append-only install log and console output.

pub mod console;
mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::{ENTRY_TARGET, Logger, STAGE_TARGET};
pub use subscriber::init_subscriber;
pub use types::{Level, LogEntry};
pub use utils::{iso_timestamp, truncate_chars};

//! File system watching and rebuild scheduling.
//!
//! This module provides:
//! - Change event types decoupled from the notification backend
//! - A `notify`-backed notification source
//! - The debounced rebuild loop that keeps the cache fresh

mod debounce;
mod events;
mod source;
mod stats;

pub use debounce::{ChangeWatcher, DEBOUNCE_DURATION};
pub use events::{ChangeEvent, ChangeKind};
pub use source::{NotificationSource, NotifySource};
pub use stats::{WatcherStats, WatcherStatsSnapshot};

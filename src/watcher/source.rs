//! Filesystem notification sources.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::{ChangeEvent, ChangeKind};
use crate::error::WatcherError;
use crate::Result;

/// Something that reports changes in a directory as [`ChangeEvent`]s.
pub trait NotificationSource: Send {
    /// Start delivering events for `dir` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established or `sink`
    /// is already closed.
    fn subscribe(&mut self, dir: &Path, sink: mpsc::Sender<ChangeEvent>) -> Result<()>;
}

/// [`NotificationSource`] backed by the platform watcher from `notify`.
///
/// The subscription lives as long as this value.
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    watched: Option<PathBuf>,
}

impl NotifySource {
    /// Create an unsubscribed source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory currently being watched.
    #[must_use]
    pub fn watched_dir(&self) -> Option<&Path> {
        self.watched.as_deref()
    }
}

impl NotificationSource for NotifySource {
    fn subscribe(&mut self, dir: &Path, sink: mpsc::Sender<ChangeEvent>) -> Result<()> {
        if sink.is_closed() {
            return Err(WatcherError::ChannelClosed.into());
        }

        if !dir.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: dir.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    let kind = ChangeKind::from_notify(&event.kind);
                    for path in event.paths {
                        if sink.blocking_send(ChangeEvent::new(path, kind)).is_err() {
                            tracing::debug!("Change event dropped, watcher loop has stopped");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Watch error");
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %dir.display(), "Watching directory");
        self.watcher = Some(watcher);
        self.watched = Some(dir.to_path_buf());
        Ok(())
    }
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

//! Debounced rebuild loop.
//!
//! ```text
//!            qualifying event             timer fires
//!   Idle ─────────────────────▶ Pending ──────────────▶ Rebuilding
//!    ▲                          │    ▲                       │
//!    │                          └────┘ more events:          │
//!    │                            coalesced, timer untouched │
//!    └───────────────────────────────────────────────────────┘
//! ```
//!
//! Events that arrive while rebuilding stay queued in the channel and start
//! the next cycle.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::events::ChangeEvent;
use super::stats::WatcherStats;
use crate::cache::{CacheStore, SnapshotBuilder};
use crate::server::{metrics, spans};

/// Default debounce window.
pub const DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    Idle,
    PendingRebuild,
    Rebuilding,
}

/// Turns change events into snapshot rebuilds.
pub struct ChangeWatcher {
    builder: SnapshotBuilder,
    store: Arc<CacheStore>,
    debounce: Duration,
    stats: Arc<WatcherStats>,
}

impl ChangeWatcher {
    /// Create a watcher that rebuilds with `builder` and installs into `store`.
    #[must_use]
    pub fn new(builder: SnapshotBuilder, store: Arc<CacheStore>, debounce: Duration) -> Self {
        Self {
            builder,
            store,
            debounce,
            stats: WatcherStats::new(),
        }
    }

    /// Get current stats.
    #[must_use]
    pub fn stats(&self) -> Arc<WatcherStats> {
        Arc::clone(&self.stats)
    }

    /// Run the loop on a background task.
    pub fn spawn(self, events: mpsc::Receiver<ChangeEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Run until the event channel closes.
    ///
    /// A rebuild that is already pending when the channel closes still runs.
    pub async fn run(self, mut events: mpsc::Receiver<ChangeEvent>) {
        let mut state = WatchState::Idle;
        let mut channel_open = true;

        loop {
            state = match state {
                WatchState::Idle => {
                    let Some(event) = events.recv().await else {
                        break;
                    };
                    if self.accept(&event) {
                        tracing::debug!(path = %event.path.display(), "Change detected, rebuild pending");
                        WatchState::PendingRebuild
                    } else {
                        WatchState::Idle
                    }
                }
                WatchState::PendingRebuild => {
                    let timer = tokio::time::sleep(self.debounce);
                    tokio::pin!(timer);

                    while channel_open {
                        tokio::select! {
                            () = &mut timer => break,
                            event = events.recv() => match event {
                                Some(event) => {
                                    self.accept(&event);
                                }
                                None => channel_open = false,
                            },
                        }
                    }
                    if !channel_open {
                        timer.await;
                    }
                    WatchState::Rebuilding
                }
                WatchState::Rebuilding => {
                    self.rebuild().await;
                    if channel_open {
                        WatchState::Idle
                    } else {
                        break;
                    }
                }
            };
        }

        tracing::info!("Change watcher stopped");
    }

    fn accept(&self, event: &ChangeEvent) -> bool {
        self.stats.events_seen.fetch_add(1, Ordering::Relaxed);
        if event.is_qualifying() {
            true
        } else {
            self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(path = %event.path.display(), kind = ?event.kind, "Ignoring change");
            false
        }
    }

    async fn rebuild(&self) {
        let span = spans::rebuild_span(self.builder.dir(), self.store.generation() + 1);
        self.rebuild_and_install().instrument(span).await;
    }

    async fn rebuild_and_install(&self) {
        self.stats.rebuilds.fetch_add(1, Ordering::Relaxed);
        tracing::info!(path = %self.builder.dir().display(), "Detected change in icons, rebuilding cache");

        let started = Instant::now();
        let result = self.builder.build_async().await;
        metrics::REBUILD_DURATION.observe(started.elapsed().as_secs_f64());

        match result {
            Ok(snapshot) => {
                let assets = snapshot.len();
                self.store.install(snapshot);
                metrics::record_rebuild(true, assets);
                tracing::info!(
                    assets,
                    generation = self.store.generation(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Cache rebuilt successfully"
                );
            }
            Err(e) => {
                self.stats.rebuild_failures.fetch_add(1, Ordering::Relaxed);
                metrics::record_rebuild(false, self.store.read().len());
                tracing::error!(error = %e, "Error rebuilding cache, keeping previous snapshot");
            }
        }
    }
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("dir", &self.builder.dir())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ChangeKind;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SHORT_DEBOUNCE: Duration = Duration::from_millis(100);

    fn setup(dir: &Path, debounce: Duration) -> (ChangeWatcher, Arc<CacheStore>) {
        let builder = SnapshotBuilder::new(dir);
        let store = Arc::new(CacheStore::new(builder.build().unwrap()));
        let watcher = ChangeWatcher::new(builder, Arc::clone(&store), debounce);
        (watcher, store)
    }

    fn svg_event(dir: &Path, name: &str) -> ChangeEvent {
        ChangeEvent::new(dir.join(name), ChangeKind::Written)
    }

    #[test]
    fn test_default_debounce() {
        assert_eq!(DEBOUNCE_DURATION, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_burst_of_events_triggers_one_rebuild() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("box.svg"), "<svg/>").unwrap();
        let (watcher, store) = setup(tmp.path(), DEBOUNCE_DURATION);
        let stats = watcher.stats();

        let (tx, rx) = mpsc::channel(16);
        let handle = watcher.spawn(rx);

        for i in 0..5 {
            tx.send(svg_event(tmp.path(), &format!("icon-{i}.svg")))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        tokio::time::sleep(Duration::from_millis(1200)).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_seen, 5);
        assert_eq!(snapshot.rebuilds, 1);
        assert_eq!(store.generation(), 1);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_picks_up_new_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("box.svg"), "<svg/>").unwrap();
        let (watcher, store) = setup(tmp.path(), SHORT_DEBOUNCE);

        let (tx, rx) = mpsc::channel(16);
        let handle = watcher.spawn(rx);

        fs::write(tmp.path().join("icon-new.svg"), "<svg/>").unwrap();
        tx.send(svg_event(tmp.path(), "icon-new.svg")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let snapshot = store.read();
        assert_eq!(snapshot.names(), &["box.svg", "icon-new.svg"]);
        assert_eq!(snapshot.token_positions("new"), Some(&[1][..]));
    }

    #[tokio::test]
    async fn test_non_qualifying_events_ignored() {
        let tmp = TempDir::new().unwrap();
        let (watcher, store) = setup(tmp.path(), SHORT_DEBOUNCE);
        let stats = watcher.stats();

        let (tx, rx) = mpsc::channel(16);
        let handle = watcher.spawn(rx);

        tx.send(ChangeEvent::new(tmp.path().join("notes.txt"), ChangeKind::Written))
            .await
            .unwrap();
        tx.send(ChangeEvent::new(tmp.path().join("box.svg"), ChangeKind::Other))
            .await
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_seen, 2);
        assert_eq!(snapshot.events_ignored, 2);
        assert_eq!(snapshot.rebuilds, 0);
        assert_eq!(store.generation(), 0);
    }

    #[tokio::test]
    async fn test_separate_windows_rebuild_separately() {
        let tmp = TempDir::new().unwrap();
        let (watcher, store) = setup(tmp.path(), SHORT_DEBOUNCE);
        let stats = watcher.stats();

        let (tx, rx) = mpsc::channel(16);
        let handle = watcher.spawn(rx);

        tx.send(svg_event(tmp.path(), "a.svg")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        tx.send(svg_event(tmp.path(), "b.svg")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(stats.snapshot().rebuilds, 2);
        assert_eq!(store.generation(), 2);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("icons");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("box.svg"), "<svg/>").unwrap();
        let (watcher, store) = setup(&dir, SHORT_DEBOUNCE);
        let stats = watcher.stats();

        let (tx, rx) = mpsc::channel(16);
        let handle = watcher.spawn(rx);

        fs::remove_dir_all(&dir).unwrap();
        tx.send(svg_event(&dir, "box.svg")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(stats.snapshot().rebuild_failures, 1);
        assert_eq!(store.generation(), 0);
        assert_eq!(store.read().names(), &["box.svg"]);
    }
}

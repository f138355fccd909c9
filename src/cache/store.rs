//! Published snapshot holder.
//!
//! Readers clone the current `Arc<Snapshot>` under a shared lock and then
//! work on it without holding anything. The writer swaps the pointer under
//! the exclusive lock. Neither side does I/O while locked.
//!
//! ```text
//! Readers (N)                    Rebuild (1)
//!   |                              |
//!   +-- store.read()               +-- builder.build()   (no lock)
//!   |   (shared: clone Arc)        |
//!   |                              +-- store.install(s)
//!   +-- serve from Arc                 (exclusive: swap Arc)
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use super::snapshot::Snapshot;

struct Published {
    snapshot: Arc<Snapshot>,
    generation: u64,
}

/// Holds the currently published [`Snapshot`].
pub struct CacheStore {
    current: RwLock<Published>,
}

impl CacheStore {
    /// Create a store publishing `initial` as generation 0.
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Published {
                snapshot: Arc::new(initial),
                generation: 0,
            }),
        }
    }

    /// Get the current snapshot.
    ///
    /// The returned `Arc` stays valid after later installs; the old snapshot
    /// is dropped when its last reader lets go.
    #[must_use]
    pub fn read(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().snapshot)
    }

    /// Get the current snapshot together with its generation.
    #[must_use]
    pub fn read_with_generation(&self) -> (Arc<Snapshot>, u64) {
        let published = self.current.read();
        (Arc::clone(&published.snapshot), published.generation)
    }

    /// Publish a fully built snapshot, replacing the current one.
    pub fn install(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let previous = {
            let mut published = self.current.write();
            published.generation += 1;
            std::mem::replace(&mut published.snapshot, snapshot)
        };
        // The old snapshot may be the last reference; drop it outside the lock.
        drop(previous);
    }

    /// Number of installs since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (snapshot, generation) = self.read_with_generation();
        f.debug_struct("CacheStore")
            .field("assets", &snapshot.len())
            .field("generation", &generation)
            .finish()
    }
}

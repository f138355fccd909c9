//! Snapshot construction from the asset directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use bytes::Bytes;

use super::scanner::scan_directory;
use super::snapshot::Snapshot;
use crate::error::CacheError;
use crate::Result;

/// Builds complete snapshots from a directory.
///
/// Building touches only local data; the result is handed to
/// [`super::CacheStore::install`] once it is fully formed.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    dir: PathBuf,
}

impl SnapshotBuilder {
    /// Create a builder for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this builder reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory and read every asset into a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Scan`] if the directory cannot be listed and
    /// [`CacheError::Read`] if any asset cannot be read. No partial snapshot
    /// is ever returned.
    pub fn build(&self) -> Result<Snapshot> {
        let started = Instant::now();
        let names = scan_directory(&self.dir)?;

        let mut assets = Vec::with_capacity(names.len());
        let mut total_bytes = 0usize;
        for name in names {
            let path = self.dir.join(&name);
            let content = std::fs::read(&path).map_err(|e| CacheError::read(&path, e))?;
            total_bytes += content.len();
            assets.push((name, Bytes::from(content)));
        }

        let snapshot = Snapshot::from_assets(assets)?;

        tracing::debug!(
            path = %self.dir.display(),
            assets = snapshot.len(),
            tokens = snapshot.token_count(),
            bytes = total_bytes,
            elapsed_ms = started.elapsed().as_millis(),
            "Snapshot built"
        );

        Ok(snapshot)
    }

    /// Async version of [`Self::build`], run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the build error, or an internal error if the task panicked.
    pub async fn build_async(&self) -> Result<Snapshot> {
        let builder = self.clone();
        tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| crate::Error::internal(format!("Snapshot build task failed: {e}")))?
    }
}

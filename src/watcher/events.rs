//! File system event types.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::EventKind;

use crate::cache::is_asset_name;

/// Kind of change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was created.
    Created,
    /// File contents were written.
    Written,
    /// File was removed.
    Removed,
    /// File was renamed (either side of the rename).
    Renamed,
    /// Anything else (access, metadata, unknown).
    Other,
}

impl ChangeKind {
    /// Map a `notify` event kind onto a change kind.
    #[must_use]
    pub fn from_notify(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Created,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Renamed,
            EventKind::Modify(ModifyKind::Metadata(_)) => Self::Other,
            EventKind::Modify(_) => Self::Written,
            EventKind::Remove(_) => Self::Removed,
            _ => Self::Other,
        }
    }

    /// Whether this kind can change the directory's asset set.
    #[must_use]
    pub fn affects_contents(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Whether this event should trigger a rebuild.
    ///
    /// The kind must affect contents and the path must carry the asset
    /// extension (case-insensitive).
    #[must_use]
    pub fn is_qualifying(&self) -> bool {
        self.kind.affects_contents() && has_asset_extension(&self.path)
    }
}

fn has_asset_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_asset_name)
}

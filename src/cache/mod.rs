//! In-memory icon cache.
//!
//! This module provides:
//! - Directory scanning for asset files
//! - Snapshot construction (contents, name index, token index, listing page)
//! - An atomically swapped snapshot store shared by all readers

mod builder;
mod page;
mod scanner;
mod snapshot;
mod store;

pub use builder::SnapshotBuilder;
pub use page::{compress_page, group_thousands, render_listing, ASSET_ROUTE_PREFIX};
pub use scanner::{is_asset_name, scan_directory, strip_asset_suffix, ASSET_SUFFIX};
pub use snapshot::{tokenize, Snapshot, MIN_TOKEN_LEN};
pub use store::CacheStore;

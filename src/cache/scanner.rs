//! Directory scanner for asset enumeration.
//!
//! Lists a single directory level and keeps files carrying the asset
//! extension, compared case-insensitively.

use std::path::Path;

use crate::error::CacheError;
use crate::Result;

/// Extension served by the cache, including the leading dot.
pub const ASSET_SUFFIX: &str = ".svg";

/// Check whether a file name carries the asset extension (case-insensitive).
#[must_use]
pub fn is_asset_name(name: &str) -> bool {
    let len = name.len();
    len >= ASSET_SUFFIX.len()
        && name
            .get(len - ASSET_SUFFIX.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ASSET_SUFFIX))
}

/// Strip the asset extension from a file name, if present.
#[must_use]
pub fn strip_asset_suffix(name: &str) -> &str {
    if is_asset_name(name) {
        &name[..name.len() - ASSET_SUFFIX.len()]
    } else {
        name
    }
}

/// Scan a directory and return the sorted asset file names.
///
/// Non-recursive. Names are sorted by byte order, which is what `String`'s
/// `Ord` gives.
///
/// # Errors
///
/// Returns [`CacheError::Scan`] if the directory cannot be listed.
pub fn scan_directory(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| CacheError::scan(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::scan(dir, e))?;

        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!(
                path = %entry.path().display(),
                "Skipping asset with non UTF-8 name"
            );
            continue;
        };

        if is_asset_name(&name) {
            names.push(name);
        }
    }

    names.sort_unstable();
    tracing::debug!(path = %dir.display(), assets = names.len(), "Directory scan complete");

    Ok(names)
}

//! Immutable point-in-time view of the asset directory.
//!
//! A [`Snapshot`] bundles everything a request needs: the sorted names,
//! their bytes, the name and token indexes, and the pre-rendered listing
//! page. All fields are derived together in [`Snapshot::from_assets`] and
//! never change afterwards; the cache replaces whole snapshots instead.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::page::{compress_page, render_listing};
use super::scanner::strip_asset_suffix;
use crate::Result;

/// Minimum length, in characters, for a token to be indexed or searched.
pub const MIN_TOKEN_LEN: usize = 2;

/// Immutable snapshot of the asset directory.
#[derive(Debug)]
pub struct Snapshot {
    names: Vec<String>,
    content_by_name: HashMap<String, Bytes>,
    index_by_name: HashMap<String, usize>,
    search_index: HashMap<String, Vec<usize>>,
    listing_page: Bytes,
    listing_page_gzip: Bytes,
    built_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from `(name, content)` pairs.
    ///
    /// Pairs must be sorted by name with no duplicates; [`super::SnapshotBuilder`]
    /// guarantees this by construction from a directory scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing page cannot be compressed.
    pub fn from_assets(assets: Vec<(String, Bytes)>) -> Result<Self> {
        debug_assert!(assets.windows(2).all(|w| w[0].0 < w[1].0));

        let mut names = Vec::with_capacity(assets.len());
        let mut content_by_name = HashMap::with_capacity(assets.len());
        let mut index_by_name = HashMap::with_capacity(assets.len());
        let mut search_index: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, (name, content)) in assets.into_iter().enumerate() {
            for token in tokenize(&name) {
                let positions = search_index.entry(token).or_default();
                if positions.last() != Some(&position) {
                    positions.push(position);
                }
            }
            index_by_name.insert(name.clone(), position);
            content_by_name.insert(name.clone(), content);
            names.push(name);
        }

        let listing_page = render_listing(&names);
        let listing_page_gzip = compress_page(&listing_page)?;

        Ok(Self {
            names,
            content_by_name,
            index_by_name,
            search_index,
            listing_page: Bytes::from(listing_page),
            listing_page_gzip: Bytes::from(listing_page_gzip),
            built_at: Utc::now(),
        })
    }

    /// Create a snapshot with no assets.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing page cannot be compressed.
    pub fn empty() -> Result<Self> {
        Self::from_assets(Vec::new())
    }

    /// Sorted asset names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the snapshot holds no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up an asset's bytes by exact name.
    #[must_use]
    pub fn content(&self, name: &str) -> Option<Bytes> {
        self.content_by_name.get(name).cloned()
    }

    /// Position of `name` in [`Self::names`].
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Positions of every asset carrying `token`.
    #[must_use]
    pub fn token_positions(&self, token: &str) -> Option<&[usize]> {
        self.search_index.get(token).map(Vec::as_slice)
    }

    /// Number of distinct indexed tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.search_index.len()
    }

    /// Iterate over every `(token, positions)` entry.
    pub fn tokens(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.search_index
            .iter()
            .map(|(token, positions)| (token.as_str(), positions.as_slice()))
    }

    /// Rendered listing page.
    #[must_use]
    pub fn listing_page(&self) -> Bytes {
        self.listing_page.clone()
    }

    /// Gzip-compressed listing page.
    #[must_use]
    pub fn listing_page_gzip(&self) -> Bytes {
        self.listing_page_gzip.clone()
    }

    /// When this snapshot was assembled.
    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Check the cross-field invariants.
    ///
    /// Returns `true` when names are strictly ascending, every index maps back
    /// to its name, content keys match names, and every token position is in
    /// bounds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let ascending = self.names.windows(2).all(|w| w[0] < w[1]);
        let indexed = self.index_by_name.len() == self.names.len()
            && self
                .names
                .iter()
                .enumerate()
                .all(|(i, n)| self.index_by_name.get(n) == Some(&i));
        let contents = self.content_by_name.len() == self.names.len()
            && self.names.iter().all(|n| self.content_by_name.contains_key(n));
        let tokens_in_bounds = self
            .search_index
            .values()
            .flatten()
            .all(|&p| p < self.names.len());

        ascending && indexed && contents && tokens_in_bounds
    }
}

/// Split an asset file name into its search tokens.
///
/// The name is lowercased, the asset extension stripped, and the rest split
/// on `-`. Pieces shorter than [`MIN_TOKEN_LEN`] characters are dropped.
#[must_use]
pub fn tokenize(name: &str) -> Vec<String> {
    let lowered = name.to_lowercase();
    strip_asset_suffix(&lowered)
        .split('-')
        .filter(|term| term.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

//! Listing, search, and pagination over the current snapshot.

mod params;

pub use params::{ListParams, ListQuery, SearchTerm, DEFAULT_LIMIT, DEFAULT_PAGE};

use serde::Serialize;

use crate::cache::{strip_asset_suffix, Snapshot};

/// Listing endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponse {
    pub page: usize,
    pub limit: usize,
    /// Size of the full candidate set before slicing.
    pub total: usize,
    pub files: Vec<String>,
}

/// Search asset names for a normalized term.
///
/// An exact token hit is answered from the index. Otherwise every name, with
/// its extension stripped and lowercased, is scanned for the term as a
/// substring.
#[must_use]
pub fn search(snapshot: &Snapshot, term: &str) -> Vec<String> {
    let names = snapshot.names();

    if let Some(positions) = snapshot.token_positions(term) {
        return positions.iter().map(|&p| names[p].clone()).collect();
    }

    names
        .iter()
        .filter(|name| strip_asset_suffix(name).to_lowercase().contains(term))
        .cloned()
        .collect()
}

/// Answer a listing query against a snapshot.
#[must_use]
pub fn list(snapshot: &Snapshot, query: &ListQuery) -> ListResponse {
    let candidates = match &query.search {
        SearchTerm::None => snapshot.names().to_vec(),
        SearchTerm::TooShort => Vec::new(),
        SearchTerm::Term(term) => search(snapshot, term),
    };
    let total = candidates.len();

    if !query.paginate {
        return ListResponse {
            page: 1,
            limit: total,
            total,
            files: candidates,
        };
    }

    let start = query
        .page
        .saturating_sub(1)
        .saturating_mul(query.limit)
        .min(total);
    let end = start.saturating_add(query.limit).min(total);

    ListResponse {
        page: query.page,
        limit: query.limit,
        total,
        files: candidates[start..end].to_vec(),
    }
}

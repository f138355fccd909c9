//! Listing query parameters.

use serde::Deserialize;

use crate::cache::MIN_TOKEN_LEN;

/// Default page number.
pub const DEFAULT_PAGE: usize = 1;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 1000;

/// Raw query string parameters for the listing endpoint.
///
/// A key that is present with an empty value (`?page=`) is `Some("")`,
/// which still counts as supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Search portion of a listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// No search requested.
    None,
    /// A search shorter than the minimum token length; matches nothing.
    TooShort,
    /// A normalized (trimmed, lowercased) search term.
    Term(String),
}

/// Normalized listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: SearchTerm,
    pub page: usize,
    pub limit: usize,
    /// Whether `page` or `limit` was supplied by the caller.
    pub paginate: bool,
}

impl ListQuery {
    /// Normalize raw parameters. Never fails; bad numbers fall back to defaults.
    #[must_use]
    pub fn from_params(params: &ListParams) -> Self {
        let normalized = params
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        let search = match normalized.chars().count() {
            0 => SearchTerm::None,
            n if n < MIN_TOKEN_LEN => SearchTerm::TooShort,
            _ => SearchTerm::Term(normalized),
        };

        Self {
            search,
            page: parse_positive(params.page.as_deref(), DEFAULT_PAGE),
            limit: parse_positive(params.limit.as_deref(), DEFAULT_LIMIT),
            paginate: params.page.is_some() || params.limit.is_some(),
        }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::from_params(&ListParams::default())
    }
}

fn parse_positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v >= 1)
        .unwrap_or(default)
}

//! Asset, listing page, and listing query endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::metrics::record_request;
use crate::cache::CacheStore;
use crate::query::{list, ListParams, ListQuery};

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Shared state for the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<CacheStore>,
}

impl AppState {
    /// Create handler state reading through `store`.
    #[must_use]
    pub const fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }
}

/// Create the asset router.
pub fn create_asset_router(state: AppState) -> Router {
    Router::new()
        .route("/assets", get(listing_page))
        .route("/assets/", get(listing_page))
        .route("/assets/list", get(list_assets))
        .route("/assets/{name}", get(serve_asset))
        .with_state(state)
}

/// Rendered listing page, gzip-encoded when the client accepts it.
async fn listing_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let snapshot = state.store.read();
    let gzip = accepts_gzip(&headers);
    record_request("listing", StatusCode::OK.as_u16());

    let mut response = if gzip {
        (
            [
                (header::CONTENT_TYPE, HTML_CONTENT_TYPE),
                (header::CONTENT_ENCODING, "gzip"),
            ],
            snapshot.listing_page_gzip(),
        )
            .into_response()
    } else {
        ([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], snapshot.listing_page()).into_response()
    };
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("accept-encoding"));
    response
}

/// Search and paginate asset names.
async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let query = ListQuery::from_params(&params);
    let snapshot = state.store.read();
    let response = list(&snapshot, &query);

    tracing::debug!(
        search = ?query.search,
        page = response.page,
        limit = response.limit,
        total = response.total,
        returned = response.files.len(),
        "Listing query"
    );
    record_request("list", StatusCode::OK.as_u16());

    Json(response)
}

/// Raw bytes of a single asset.
async fn serve_asset(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.read().content(&name) {
        Some(content) => {
            record_request("asset", StatusCode::OK.as_u16());
            ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], content).into_response()
        }
        None => {
            tracing::debug!(name = %name, "Asset not found");
            record_request("asset", StatusCode::NOT_FOUND.as_u16());
            (StatusCode::NOT_FOUND, "404 page not found").into_response()
        }
    }
}

/// Whether an `Accept-Encoding` header allows gzip.
///
/// Honors `q=0` as a refusal; `*` counts as acceptance.
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|coding| {
            let mut parts = coding.split(';').map(str::trim);
            let name = parts.next().unwrap_or_default();
            let refused = parts.any(|p| {
                p.strip_prefix("q=")
                    .and_then(|q| q.parse::<f32>().ok())
                    .is_some_and(|q| q <= 0.0)
            });
            (name.eq_ignore_ascii_case("gzip") || name == "*") && !refused
        })
}

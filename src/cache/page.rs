//! Listing page rendering.

use std::fmt::Write as _;
use std::io::Write as _;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::CacheError;
use crate::Result;

/// Path prefix under which individual assets are served.
pub const ASSET_ROUTE_PREFIX: &str = "/assets/";

const PAGE_HEAD: &str = concat!(
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
    "<title>Icon Server - All Icons</title><style>",
    "body { font-family: Arial, sans-serif; margin: 20px; }",
    ".icon-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(250px, 1fr)); gap: 15px; }",
    ".icon-item { text-align: center; padding: 10px; border: 1px solid #eee; border-radius: 5px; }",
    ".icon-item:hover { background-color: #f5f5f5; }",
    ".icon-img { height: 50px; width: 50px; margin-bottom: 5px; }",
    ".icon-name { word-break: break-all; font-size: 12px; }",
    "</style></head><body>",
);

const PAGE_TAIL: &str = "</div></body></html>";

/// Render the HTML listing page for the given sorted names.
#[must_use]
pub fn render_listing(names: &[String]) -> Vec<u8> {
    let mut html = String::with_capacity(PAGE_HEAD.len() + names.len() * 128);
    html.push_str(PAGE_HEAD);
    let _ = write!(
        html,
        "<h1>Available Icons (Total: {})</h1><div class=\"icon-grid\">",
        group_thousands(names.len())
    );

    for name in names {
        let escaped = escape_html(name);
        let _ = write!(
            html,
            "<div class=\"icon-item\"><a href=\"{ASSET_ROUTE_PREFIX}{escaped}\">\
             <img class=\"icon-img\" src=\"{ASSET_ROUTE_PREFIX}{escaped}\" alt=\"\" loading=\"lazy\">\
             <div class=\"icon-name\">{escaped}</div></a></div>"
        );
    }

    html.push_str(PAGE_TAIL);
    html.into_bytes()
}

/// Gzip-compress a rendered page.
///
/// Output is deterministic: the gzip header carries no mtime or file name.
///
/// # Errors
///
/// Returns [`CacheError::Render`] if the encoder fails.
pub fn compress_page(page: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(page.len() / 4), Compression::default());
    encoder
        .write_all(page)
        .map_err(|e| CacheError::Render(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CacheError::Render(e.to_string()))?;
    Ok(compressed)
}

/// Format a count with comma thousands separators (`1234567` -> `1,234,567`).
#[must_use]
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

//! Error types and Result aliases for the icon server.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for icon server operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot build error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Server/API error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised while building a snapshot.
///
/// Any of these aborts the rebuild; the published snapshot is left alone.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Asset directory could not be listed.
    #[error("failed to scan '{path}': {reason}")]
    Scan { path: String, reason: String },

    /// A single asset could not be read.
    #[error("failed to read asset '{path}': {reason}")]
    Read { path: String, reason: String },

    /// Listing page could not be rendered or compressed.
    #[error("failed to render listing page: {0}")]
    Render(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Event sink was closed before subscribing.
    #[error("event channel closed")]
    ChannelClosed,
}

/// Server/API errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl CacheError {
    /// Create a scan error for a directory.
    pub fn scan(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Scan {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a read error for an asset file.
    pub fn read(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

//! Icon server library.
//!
//! Serves a directory of SVG icons from an in-memory snapshot that is rebuilt
//! whenever the directory changes.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod query;
pub mod server;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};

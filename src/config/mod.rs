//! Configuration management for the icon server.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Configuration file (lowest priority)

mod file;
mod resolver;
mod settings;

pub use file::{FileConfig, CONFIG_FILE};
pub use resolver::{ConfigOverrides, ConfigResolver, LayeredResolver};
pub use settings::{socket_addr, Config};

//! Configuration resolution.
//!
//! A [`ConfigResolver`] produces a validated [`Config`] or reports that the
//! user backed out. The server never talks to a human directly; an
//! interactive front end would be another resolver.

use std::path::PathBuf;
use std::time::Duration;

use super::file::FileConfig;
use super::settings::Config;
use crate::Result;

/// Produces the configuration the server starts with.
pub trait ConfigResolver {
    /// Resolve a validated configuration.
    ///
    /// Returns `Ok(None)` if resolution was cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be read or the merged result is
    /// invalid.
    fn resolve(&self) -> Result<Option<Config>>;
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub asset_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_json: bool,
    pub debug_requests: Option<bool>,
    pub debounce: Option<Duration>,
}

/// Merges command line flags over a config file over defaults.
#[derive(Debug, Clone)]
pub struct LayeredResolver {
    overrides: ConfigOverrides,
    file: Option<PathBuf>,
}

impl LayeredResolver {
    /// Create a resolver. `file` is the optional config file layer.
    #[must_use]
    pub const fn new(overrides: ConfigOverrides, file: Option<PathBuf>) -> Self {
        Self { overrides, file }
    }

    /// Merge all layers without validating.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn merge(&self) -> Result<Config> {
        let file = match &self.file {
            Some(path) => FileConfig::load(path)?.unwrap_or_default(),
            None => FileConfig::default(),
        };
        let defaults = Config::default();
        let overrides = self.overrides.clone();

        Ok(Config {
            asset_dir: overrides
                .asset_dir
                .or(file.asset_dir)
                .unwrap_or(defaults.asset_dir),
            host: overrides.host.unwrap_or(defaults.host),
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            log_level: overrides.log_level.unwrap_or(defaults.log_level),
            log_json: overrides.log_json || defaults.log_json,
            debug_requests: overrides
                .debug_requests
                .or(file.debug_mode)
                .unwrap_or(defaults.debug_requests),
            debounce: overrides.debounce.unwrap_or(defaults.debounce),
        })
    }

    /// Persist the file-backed fields of `config` to the config file layer.
    ///
    /// Does nothing if no config file was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, config: &Config) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        FileConfig {
            port: Some(config.port),
            asset_dir: Some(config.asset_dir.clone()),
            debug_mode: Some(config.debug_requests),
        }
        .save(path)
    }
}

impl ConfigResolver for LayeredResolver {
    fn resolve(&self) -> Result<Option<Config>> {
        let config = self.merge()?;
        config.validate()?;
        Ok(Some(config))
    }
}

//! Configuration settings and validation.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::is_asset_name;
use crate::watcher::DEBOUNCE_DURATION;
use crate::{Error, Result};

/// Upper bound on the debounce window.
const MAX_DEBOUNCE: Duration = Duration::from_secs(60);

/// Main configuration for the icon server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SVG assets.
    pub asset_dir: PathBuf,

    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,

    /// Log every HTTP request.
    pub debug_requests: bool,

    /// Debounce window for filesystem changes.
    pub debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("./icons"),
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_json: false,
            debug_requests: false,
            debounce: DEBOUNCE_DURATION,
        }
    }
}

/// Parse `host` and `port` into a socket address.
///
/// `host` must be an IP address; names are not resolved.
///
/// # Errors
///
/// Returns a config error if `host` is not an IP address.
pub fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host.trim().parse().map_err(|e| {
        Error::config(format!("invalid host '{host}', expected an IP address: {e}"))
    })?;
    Ok(SocketAddr::new(ip, port))
}

impl Config {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }
        self.server_addr()?;

        if self.debounce.is_zero() || self.debounce > MAX_DEBOUNCE {
            return Err(Error::config(format!(
                "debounce must be between 1ms and {}s",
                MAX_DEBOUNCE.as_secs()
            )));
        }

        if !self.asset_dir.is_dir() {
            return Err(Error::config(format!(
                "asset directory '{}' does not exist or is not a directory",
                self.asset_dir.display()
            )));
        }

        Ok(())
    }

    /// Whether the asset directory currently holds at least one asset.
    #[must_use]
    pub fn has_assets(&self) -> bool {
        std::fs::read_dir(&self.asset_dir).is_ok_and(|entries| {
            entries.flatten().any(|entry| {
                entry.file_type().is_ok_and(|t| !t.is_dir())
                    && entry.file_name().to_str().is_some_and(is_asset_name)
            })
        })
    }

    /// Socket address the server binds to.
    ///
    /// # Errors
    ///
    /// Returns a config error if `host` is not an IP address.
    pub fn server_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            asset_dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.debounce, DEBOUNCE_DURATION);
        assert!(!config.debug_requests);
    }

    #[test]
    fn test_validate_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(config_in(&tmp).validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            port: 0,
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            log_level: "invalid".to_string(),
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..config_in(&tmp)
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_empty_host() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            host: String::new(),
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_validate_debounce_bounds() {
        let tmp = TempDir::new().unwrap();
        let zero = Config {
            debounce: Duration::ZERO,
            ..config_in(&tmp)
        };
        assert!(zero.validate().unwrap_err().to_string().contains("debounce"));

        let huge = Config {
            debounce: Duration::from_secs(3600),
            ..config_in(&tmp)
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_validate_missing_asset_dir() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            asset_dir: tmp.path().join("missing"),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("asset directory"));
    }

    #[test]
    fn test_has_assets() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        assert!(!config.has_assets());

        std::fs::write(tmp.path().join("readme.txt"), "x").unwrap();
        assert!(!config.has_assets());

        std::fs::write(tmp.path().join("box.SVG"), "<svg/>").unwrap();
        assert!(config.has_assets());
    }

    #[test]
    fn test_server_addr() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 9090,
            ..Default::default()
        };
        assert_eq!(
            config.server_addr().unwrap(),
            "0.0.0.0:9090".parse::<SocketAddr>().unwrap()
        );

        let v6 = Config {
            host: "::1".to_string(),
            port: 9090,
            ..Default::default()
        };
        assert_eq!(v6.server_addr().unwrap().to_string(), "[::1]:9090");
    }

    #[test]
    fn test_validate_rejects_host_name() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            host: "localhost".to_string(),
            ..config_in(&tmp)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid host 'localhost'"));
    }
}

//! Persisted configuration file.

use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Result;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "config.json";

/// Value written by older servers for a field that was never chosen.
const UNSET_PLACEHOLDER: &str = "nil";

/// On-disk configuration. Every field is optional; missing values fall
/// through to the next layer.
///
/// The port is stored as a string and the directory under `iconDir`.
/// Numeric ports and the `assetDir` key are accepted on load, and
/// `"nil"` or an empty string reads as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_port",
        deserialize_with = "deserialize_port"
    )]
    pub port: Option<u16>,

    #[serde(
        default,
        rename = "iconDir",
        alias = "assetDir",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_dir"
    )]
    pub asset_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
}

impl FileConfig {
    /// Load a configuration file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&data)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded config file");
        Ok(Some(config))
    }

    /// Write the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        tracing::info!(path = %path.display(), "Saved config file");
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == UNSET_PLACEHOLDER
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_port<S: Serializer>(
    port: &Option<u16>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match port {
        Some(port) => serializer.serialize_str(&port.to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_port<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u16>, D::Error> {
    match Option::<PortValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortValue::Number(port)) => Ok(Some(port)),
        Some(PortValue::Text(text)) if is_unset(&text) => Ok(None),
        Some(PortValue::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid port '{text}'"))),
    }
}

fn deserialize_dir<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<PathBuf>, D::Error> {
    let dir = Option::<String>::deserialize(deserializer)?;
    Ok(dir.filter(|d| !is_unset(d)).map(PathBuf::from))
}

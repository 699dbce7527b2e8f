//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `hcdev` binary)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HcError, Result};
use crate::protocol::{Identity, DEFAULT_VERSION};

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Client identity and request defaults
    #[serde(default)]
    pub client: ClientConfig,

    /// Feature catalog location
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| HcError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| HcError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("HCDEV_DEVICE_NAME") {
            config.client.device_name = name;
        }
        if let Ok(id) = std::env::var("HCDEV_DEVICE_ID") {
            config.client.device_id = id;
        }
        if let Ok(path) = std::env::var("HCDEV_CATALOG") {
            config.catalog.path = Some(PathBuf::from(path));
        }

        config
    }

    /// Default config file location (`<config dir>/hcdev/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hcdev").join("config.toml"))
    }

    /// Merge with another config (other takes precedence where it differs from defaults)
    pub fn merge(self, other: Self) -> Self {
        let defaults = ClientConfig::default();
        Self {
            client: ClientConfig {
                device_name: if other.client.device_name != defaults.device_name {
                    other.client.device_name
                } else {
                    self.client.device_name
                },
                device_id: if other.client.device_id != defaults.device_id {
                    other.client.device_id
                } else {
                    self.client.device_id
                },
                default_version: if other.client.default_version != defaults.default_version {
                    other.client.default_version
                } else {
                    self.client.default_version
                },
            },
            catalog: CatalogConfig {
                path: other.catalog.path.or(self.catalog.path),
            },
        }
    }
}

/// Client identity presented to the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name shown in the device's registered clients
    pub device_name: String,

    /// Client id
    pub device_id: String,

    /// Version for requests before services are known
    pub default_version: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device_name: "hcpy".to_string(),
            device_id: "0badcafe".to_string(),
            default_version: DEFAULT_VERSION,
        }
    }
}

impl ClientConfig {
    /// Identity record for the initial-values reply
    pub fn identity(&self) -> Identity {
        Identity::new(&self.device_name, &self.device_id)
    }
}

/// Feature catalog configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON feature table of the device profile
    pub path: Option<PathBuf>,
}

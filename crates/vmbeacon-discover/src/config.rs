//! Discovery configuration.
//!
//! Loaded in order, later sources overriding earlier ones:
//! 1. Config file: an explicit path, or `<config dir>/vmbeacon/config.json`
//! 2. Environment override: `VMBEACON_ENABLE_LOCAL_DISCOVERY`
//!
//! The binary applies its command-line flags on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, DiscoverError};

/// Environment variable overriding [`DiscoveryConfig::enable_local_discovery`].
pub const ENABLE_LOCAL_DISCOVERY_ENV: &str = "VMBEACON_ENABLE_LOCAL_DISCOVERY";

/// Discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Whether sessions may be advertised on the local network at all.
    pub enable_local_discovery: bool,

    /// Log level name (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enable_local_discovery: true,
            log_level: None,
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from the file and the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub async fn load(path: Option<&Path>) -> Result<Self, DiscoverError> {
        let config = match path {
            Some(path) => Self::load_file(path).await?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_file(&path).await?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok())?)
    }

    /// Parse a config file.
    pub async fn load_file(path: &Path) -> Result<Self, DiscoverError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io(e)
            }
        })?;
        debug!(path = %path.display(), "Loaded discovery config");
        Ok(Self::parse(&content)?)
    }

    /// Parse config JSON.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENABLE_LOCAL_DISCOVERY_ENV) {
            self.enable_local_discovery =
                parse_flag(&value).ok_or_else(|| ConfigError::InvalidFlag {
                    name: ENABLE_LOCAL_DISCOVERY_ENV,
                    value: value.clone(),
                })?;
        }
        Ok(self)
    }

    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vmbeacon").join("config.json"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

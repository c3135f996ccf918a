//! Error types for the discover crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during mDNS operations.
///
/// Suppressed advertisements and malformed TXT records are not errors; they
/// surface as [`crate::AdvertiseOutcome::Suppressed`] and `None` respectively.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// Error from the zeroconf library.
    #[error("mDNS error: {0}")]
    Zeroconf(#[from] zeroconf::error::Error),

    /// Error creating service info.
    #[error("Service info error: {0}")]
    ServiceInfo(String),

    /// The responder could not be started or stopped.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A metadata provider failed to answer.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Caller supplied an argument that can never be valid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons a [`crate::DiscoveryConfig`] could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override held something other than a boolean.
    #[error("{name} must be true or false, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_info_error_display() {
        let error = DiscoverError::ServiceInfo("invalid service name".to_string());
        assert_eq!(
            format!("{}", error),
            "Service info error: invalid service name"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let error = DiscoverError::Transport("no usable interface".to_string());
        assert_eq!(error.to_string(), "Transport error: no usable interface");
    }

    #[test]
    fn test_invalid_input_error_display() {
        let error = DiscoverError::InvalidInput("app name must not be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid input: app name must not be empty"
        );
    }

    #[test]
    fn test_config_error_wraps_reason() {
        let error: DiscoverError = ConfigError::NotFound(PathBuf::from("/tmp/absent.json")).into();
        assert!(matches!(error, DiscoverError::Config(ConfigError::NotFound(_))));
        assert_eq!(
            error.to_string(),
            "Config error: config file not found: /tmp/absent.json"
        );
    }

    #[test]
    fn test_invalid_flag_display() {
        let error = ConfigError::InvalidFlag {
            name: "VMBEACON_ENABLE_LOCAL_DISCOVERY",
            value: "sometimes".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "VMBEACON_ENABLE_LOCAL_DISCOVERY must be true or false, got \"sometimes\""
        );
    }
}

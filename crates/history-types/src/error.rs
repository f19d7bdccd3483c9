//! Error types for settings loading.

use thiserror::Error;

/// Errors raised while loading or validating [`crate::Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Layered configuration could not be built or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration loaded but a value is out of range
    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl From<config::ConfigError> for SettingsError {
    fn from(err: config::ConfigError) -> Self {
        SettingsError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SettingsError::Config("missing file".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing file");

        let err = SettingsError::Invalid {
            field: "import.job_queue_size",
            reason: "must be > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting import.job_queue_size: must be > 0"
        );
    }
}

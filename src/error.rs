//! Error types for echolog.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchologError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Missing credentials: {message}")]
    ConfigMissingCredentials { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    // Remote service errors
    #[error("Network transport error: {message}")]
    Transport { message: String },

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Transcription produced no text after {attempts} attempts")]
    EmptyTranscription { attempts: u32 },

    #[error("Insufficient free memory: {available} bytes available, {required} required")]
    ResourceExhausted { available: u64, required: u64 },

    // Persistence errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EchologError {
    /// Whether a transcription attempt that failed with this error is worth
    /// retrying. Transport faults, bad responses and empty bodies are
    /// transient; everything else fails the chunk immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EchologError::Transport { .. }
                | EchologError::Service { .. }
                | EchologError::EmptyTranscription { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EchologError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = EchologError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_missing_credentials_display() {
        let error = EchologError::ConfigMissingCredentials {
            message: "set ECHOLOG_API_KEY".to_string(),
        };
        assert_eq!(error.to_string(), "Missing credentials: set ECHOLOG_API_KEY");
    }

    #[test]
    fn test_transport_display() {
        let error = EchologError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Network transport error: connection refused"
        );
    }

    #[test]
    fn test_service_display() {
        let error = EchologError::Service {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(error.to_string(), "Service error (503): overloaded");
    }

    #[test]
    fn test_empty_transcription_display() {
        let error = EchologError::EmptyTranscription { attempts: 3 };
        assert_eq!(
            error.to_string(),
            "Transcription produced no text after 3 attempts"
        );
    }

    #[test]
    fn test_resource_exhausted_display() {
        let error = EchologError::ResourceExhausted {
            available: 1024,
            required: 4096,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient free memory: 1024 bytes available, 4096 required"
        );
    }

    #[test]
    fn test_storage_display() {
        let error = EchologError::Storage {
            message: "write failed".to_string(),
        };
        assert_eq!(error.to_string(), "Storage error: write failed");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            EchologError::Transport {
                message: "timeout".to_string()
            }
            .is_retryable()
        );
        assert!(
            EchologError::Service {
                status: 500,
                message: "oops".to_string()
            }
            .is_retryable()
        );
        assert!(EchologError::EmptyTranscription { attempts: 1 }.is_retryable());
        assert!(
            !EchologError::ConfigMissingCredentials {
                message: "no key".to_string()
            }
            .is_retryable()
        );
        assert!(
            !EchologError::Storage {
                message: "disk full".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: EchologError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: EchologError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<EchologError>();
        assert_sync::<EchologError>();
    }
}

//! Error types for upload/process/download operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Message shown when the service fails without a usable explanation
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing the image";

/// Message shown when the service answers 2xx but reports `success: false` without a reason
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image";

/// Format a size limit the way the UI names it: `10MB`, `1.5MB`, `512KB`
///
/// Whole values drop the fractional part; anything under 1 MiB is shown in KB.
#[must_use]
pub fn format_size_limit(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let bytes_f = bytes as f64;
    let (value, unit) = if bytes_f >= MIB {
        (bytes_f / MIB, "MB")
    } else if bytes_f >= KIB {
        (bytes_f / KIB, "KB")
    } else {
        return format!("{}B", bytes);
    };

    let rounded = format!("{:.1}", value);
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{}{}", trimmed, unit)
}

/// Local selection constraint violations
///
/// These never reach the network. The display text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The file does not declare an `image/*` MIME type
    #[error("Please select a valid image file")]
    NotAnImage {
        /// Declared MIME type (empty when unknown)
        mime: String,
    },

    /// The file is larger than the configured limit
    #[error("File is too large. Maximum size is {}", format_size_limit(*.max))]
    TooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured limit in bytes
        max: u64,
    },
}

/// Error types for the background removal client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Selected file failed local validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service answered with a structured failure
    #[error("Service error{}: {}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(), .message)]
    Service {
        /// HTTP status when the failure came from a non-2xx response
        status: Option<u16>,
        /// Human-readable reason
        message: String,
    },

    /// Network-level failure (connection refused, timeout, TLS, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request never completed, without a reqwest error to carry
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a body we could not interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The processed image payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation requested in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ClientError {
    /// Create a new service error
    pub fn service<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "{} value {} is out of range (valid: {})",
            parameter, value, valid_range
        ))
    }

    /// Text to put in the error banner
    ///
    /// Validation and service-reported failures are surfaced verbatim; transport and
    /// parse failures collapse to a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Service { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Service { .. }
            | Self::Transport(_)
            | Self::Network(_)
            | Self::MalformedResponse(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            },
            Self::Decode(msg) | Self::InvalidConfig(msg) | Self::InvalidState(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Whether the failure happened before any request was issued
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

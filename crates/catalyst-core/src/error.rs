//! Error types for the catalyst records console

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the catalyst records console
#[derive(Error, Debug)]
pub enum Error {
    /// The backend could not be reached (DNS, connection refused, TLS, ...)
    #[error("Transport error: {message}")]
    Transport {
        /// Error message
        message: String,
    },

    /// The backend answered with a non-2xx status.
    ///
    /// Displays as the bare message so callers can surface it verbatim.
    #[error("{message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or the generic fallback
        message: String,
    },

    /// A response that should have been JSON was not
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Token acquisition failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// The owning screen was unmounted while the operation was in flight
    #[error("Operation cancelled")]
    Cancelled,

    /// Not found error
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Resource that was not found
        resource: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Validation error
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new transport error
    #[must_use]
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    #[must_use]
    pub fn http_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a new authentication error
    #[must_use]
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new not found error
    #[must_use]
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// HTTP status code, if the backend produced one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error came from token acquisition
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether the operation was abandoned because its screen went away
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation {
            field: "config".to_string(),
            message: errors.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as StdError;

    #[test]
    fn test_http_status_displays_bare_message() {
        let error = Error::http_status(422, "Invalid claim ID format");
        assert_eq!(error.to_string(), "Invalid claim ID format");
        assert_eq!(error.status(), Some(422));
    }

    #[test]
    fn test_transport_error() {
        let error = Error::transport("connection refused");
        assert_eq!(error.to_string(), "Transport error: connection refused");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_parse_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = Error::from(json_error);

        match error {
            Error::Parse(_) => {}
            _ => panic!("Expected Parse error variant"),
        }
        assert!(error.to_string().starts_with("Failed to parse response"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_auth_error() {
        let error = Error::auth("Login required");
        assert!(error.is_auth());
        assert_eq!(error.to_string(), "Authentication failed: Login required");
    }

    #[test]
    fn test_timeout_and_cancelled() {
        assert_eq!(
            Error::Timeout { duration_ms: 30000 }.to_string(),
            "Request timed out after 30000ms"
        );
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Other("x".to_string()).is_cancelled());
    }

    #[test]
    fn test_not_found_error() {
        let error = Error::not_found("claims/17");
        assert_eq!(error.to_string(), "Resource not found: claims/17");
    }

    #[test]
    fn test_configuration_error_from_config_crate() {
        let err = config::ConfigError::Message("missing field `api`".to_string());
        let error = Error::from(err);
        assert!(error.to_string().contains("missing field `api`"));
    }
}

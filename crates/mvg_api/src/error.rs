//! MVG error types

use thiserror::Error;

/// Errors that can occur during MVG API operations
#[derive(Debug, Error)]
pub enum MvgError {
    /// A station reference was unusable before any request was made
    #[error("Invalid station: {0}")]
    InvalidStation(String),

    /// A route endpoint was unusable; names whether start or destination failed
    #[error("Invalid route {side}: {reason}")]
    InvalidRouteEndpoint {
        /// Which endpoint was rejected ("start" or "destination")
        side: String,
        /// Why it was rejected
        reason: String,
    },

    /// Coordinates with a zero component, which the API treats as unset
    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },

    /// A name lookup matched no station where one was required
    #[error("No station found matching '{query}'")]
    NoStationFound {
        /// The query that failed to resolve
        query: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection to the MVG service failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// The API answered with a non-2xx status
    #[error("API request failed with HTTP {status}: {message}")]
    Api {
        /// Numeric HTTP status code
        status: u16,
        /// Best-effort response body
        message: String,
    },

    /// Failed to parse a response payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// An epoch-millisecond value outside the representable range
    #[error("Timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
}

impl MvgError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(MvgError::Connection("test".to_string()).is_retryable());
        assert!(MvgError::Timeout { timeout_secs: 10 }.is_retryable());
        assert!(
            MvgError::Api {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            MvgError::Api {
                status: 429,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!MvgError::InvalidStation("test".to_string()).is_retryable());
        assert!(!MvgError::Parse("test".to_string()).is_retryable());
        assert!(!MvgError::TimestampOutOfRange(i64::MAX).is_retryable());
        assert!(
            !MvgError::NoStationFound {
                query: "Nirgendwo".to_string()
            }
            .is_retryable()
        );
        assert!(
            !MvgError::Api {
                status: 404,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = MvgError::Api {
            status: 500,
            message: "internal error".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("internal error"));

        let err = MvgError::NoStationFound {
            query: "Hauptbahnhof".to_string(),
        };
        assert!(err.to_string().contains("Hauptbahnhof"));

        let err = MvgError::InvalidRouteEndpoint {
            side: "destination".to_string(),
            reason: "malformed composite id".to_string(),
        };
        assert!(err.to_string().contains("destination"));

        let err = MvgError::InvalidCoordinates {
            latitude: 0.0,
            longitude: 11.6,
        };
        assert!(err.to_string().contains("11.6"));
    }
}

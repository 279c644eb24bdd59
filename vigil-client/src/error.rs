//! Error types for the CI clients

use thiserror::Error;

/// Result type alias for CI client operations
pub type Result<T> = std::result::Result<T, CiError>;

/// Errors that can occur when querying a CI backend
///
/// Every variant maps onto a numeric status code through
/// [`CiError::status_code`]: 404 means the job is gone, 400 means it exists
/// but has never built, anything else is a transient failure.
#[derive(Debug, Error)]
pub enum CiError {
    /// The backend no longer knows the job
    #[error("Job not found: {0}")]
    NotFound(String),

    /// The job exists but has not produced a build yet
    #[error("Job has no build yet: {0}")]
    NoBuildYet(String),

    /// Backend returned an unexpected status code
    #[error("CI API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body returned by the backend
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl CiError {
    /// Maps an HTTP status onto the matching error variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            404 => Self::NotFound(message.into()),
            400 => Self::NoBuildYet(message.into()),
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }

    /// Numeric code of this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NoBuildYet(_) => 400,
            Self::Api { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()).unwrap_or(500),
            Self::Parse(_) => 500,
        }
    }

    /// Check if this error means the job was deleted on the backend
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }

    /// Check if this error means the job has not built yet
    pub fn is_no_build_yet(&self) -> bool {
        self.status_code() == 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_known_codes() {
        assert!(matches!(CiError::from_status(404, "x"), CiError::NotFound(_)));
        assert!(matches!(CiError::from_status(400, "x"), CiError::NoBuildYet(_)));
        assert!(matches!(
            CiError::from_status(503, "x"),
            CiError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CiError::NotFound("a".into()).status_code(), 404);
        assert_eq!(CiError::NoBuildYet("a".into()).status_code(), 400);
        assert_eq!(CiError::Parse("bad".into()).status_code(), 500);
        assert!(CiError::from_status(404, "gone").is_not_found());
        assert!(CiError::from_status(400, "new").is_no_build_yet());
        assert!(!CiError::from_status(500, "boom").is_not_found());
    }
}

//! Error types for EUCLOUD.

use thiserror::Error;

/// Common error type for EUCLOUD.
#[derive(Error, Debug)]
pub enum EucloudError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or bad credentials.
    ///
    /// The message is shown to clients, so it never says which credential was wrong.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Session token failed signature, payload or expiry checks.
    #[error("invalid token")]
    InvalidToken,

    /// Resource already exists (e.g. a duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found, or not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation would push storage usage over the user's quota.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// A single payload is larger than the configured upload limit.
    #[error("payload too large (max {max_bytes} bytes)")]
    PayloadTooLarge {
        /// Configured limit.
        max_bytes: u64,
    },

    /// Metadata references a blob that is missing from disk.
    #[error("storage inconsistency: {0}")]
    StorageInconsistency(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for EucloudError {
    fn from(e: sqlx::Error) -> Self {
        EucloudError::Database(e.to_string())
    }
}

/// Result type alias for EUCLOUD operations.
pub type Result<T> = std::result::Result<T, EucloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_display() {
        let err = EucloudError::Unauthorized("Invalid email or password".to_string());
        assert_eq!(err.to_string(), "unauthorized: Invalid email or password");
    }

    #[test]
    fn test_not_found_display() {
        let err = EucloudError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_quota_exceeded_display() {
        assert_eq!(
            EucloudError::QuotaExceeded.to_string(),
            "storage quota exceeded"
        );
    }

    #[test]
    fn test_payload_too_large_display() {
        let err = EucloudError::PayloadTooLarge { max_bytes: 1024 };
        assert_eq!(err.to_string(), "payload too large (max 1024 bytes)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EucloudError = io_err.into();
        assert!(matches!(err, EucloudError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: EucloudError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, EucloudError::Database(_)));
    }
}

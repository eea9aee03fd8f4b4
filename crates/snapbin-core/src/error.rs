//! Application error taxonomy.
//!
//! Every failure surfaced to a caller is one of these variants. Each variant
//! knows its HTTP status, a stable machine-readable code, whether a retry can
//! help, and the log level it should be reported at.

/// Log level for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures.
    Debug,
    /// Recoverable conditions such as rate limits.
    Warn,
    /// Unexpected failures.
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Server overloaded: {0}")]
    Overloaded(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Rejected by content policy: {0}")]
    PolicyRejection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::RateLimited { .. } => 429,
            AppError::Overloaded(_) => 503,
            AppError::Storage(_) => 500,
            AppError::PolicyRejection(_) => 422,
            AppError::NotFound(_) => 404,
            AppError::Expired(_) => 410,
            AppError::Transform(_) => 500,
            AppError::Database(_) => 500,
            AppError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error kind for the response body.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::RateLimited { .. } => "rate_limit_exceeded",
            AppError::Overloaded(_) => "overloaded",
            AppError::Storage(_) => "storage_error",
            AppError::PolicyRejection(_) => "policy_rejection",
            AppError::NotFound(_) => "not_found",
            AppError::Expired(_) => "expired",
            AppError::Transform(_) => "transform_error",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether retrying the same request can succeed without a client change.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::RateLimited { .. } | AppError::Overloaded(_) | AppError::Storage(_)
        )
    }

    /// Seconds the client should wait before retrying, when known.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AppError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_) | AppError::NotFound(_) | AppError::Expired(_) => {
                LogLevel::Debug
            }
            AppError::RateLimited { .. }
            | AppError::Overloaded(_)
            | AppError::PolicyRejection(_) => LogLevel::Warn,
            AppError::Storage(_)
            | AppError::Transform(_)
            | AppError::Database(_)
            | AppError::Internal(_) => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::Validation("bad ext".into()).http_status_code(), 400);
        assert_eq!(
            AppError::RateLimited { retry_after_secs: 7 }.http_status_code(),
            429
        );
        assert_eq!(AppError::PolicyRejection("unsafe".into()).http_status_code(), 422);
        assert_eq!(AppError::NotFound("code".into()).http_status_code(), 404);
        assert_eq!(AppError::Expired("code".into()).http_status_code(), 410);
        assert_eq!(AppError::Overloaded("busy".into()).http_status_code(), 503);
    }

    #[test]
    fn expired_is_distinct_from_not_found() {
        assert_ne!(
            AppError::Expired("x".into()).error_code(),
            AppError::NotFound("x".into()).error_code()
        );
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let err = AppError::RateLimited { retry_after_secs: 42 };
        assert_eq!(err.retry_after_secs(), Some(42));
        assert!(err.is_recoverable());
    }

    #[test]
    fn validation_is_not_retried() {
        assert!(!AppError::Validation("oversize".into()).is_recoverable());
        assert_eq!(AppError::Validation("oversize".into()).log_level(), LogLevel::Debug);
    }
}

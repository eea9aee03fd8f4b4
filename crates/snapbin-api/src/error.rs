//! HTTP error response conversion.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! are `AppError` (or convert into it) and render consistently here: status
//! code, JSON body, Retry-After header, and a log event at the taxonomy's
//! level.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use snapbin_core::{AppError, LogLevel};
use snapbin_infra::GovernorError;
use snapbin_processing::validator::ValidationError;
use snapbin_storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error kind for programmatic handling.
    pub code: String,
    /// Whether retrying the same request can succeed.
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Wrapper for AppError so IntoResponse can be implemented here. Orphan rules
/// forbid implementing the axum trait for the snapbin-core type directly.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(AppError::Validation(err.to_string()))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => HttpAppError(AppError::NotFound(name)),
            other => HttpAppError(AppError::Storage(other.to_string())),
        }
    }
}

impl From<GovernorError> for HttpAppError {
    fn from(err: GovernorError) -> Self {
        match err {
            GovernorError::PipelineFull => HttpAppError(AppError::Overloaded(err.to_string())),
            other => HttpAppError(AppError::Internal(other.to_string())),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;

        match err.log_level() {
            LogLevel::Debug => tracing::debug!(code = err.error_code(), error = %err, "Request failed"),
            LogLevel::Warn => tracing::warn!(code = err.error_code(), error = %err, "Request failed"),
            LogLevel::Error => tracing::error!(code = err.error_code(), error = %err, "Request failed"),
        }

        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after_secs = err.retry_after_secs();
        let body = ErrorResponse {
            error: err.to_string(),
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            retry_after_secs,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_carries_retry_after_header() {
        let response =
            HttpAppError(AppError::RateLimited { retry_after_secs: 9 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from_static("9"))
        );
    }

    #[test]
    fn storage_not_found_maps_to_404() {
        let err: HttpAppError = StorageError::NotFound("x.png".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn pipeline_full_maps_to_503() {
        let err: HttpAppError = GovernorError::PipelineFull.into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

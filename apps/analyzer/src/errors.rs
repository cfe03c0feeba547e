use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::orchestrator::AnalysisFailure;
use crate::analysis::result::FailureReason;
use crate::analysis::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// 4xx variants echo their message to the caller. 5xx variants log the
/// diagnostic and answer with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A `PersistenceError` failure that arrives without its completed result.
    /// `handle_analyze` answers failures that still carry the score with 200,
    /// so this variant only covers callers that convert the failure directly.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not implemented")]
    NotImplemented,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<AnalysisFailure> for AppError {
    fn from(failure: AnalysisFailure) -> Self {
        let message = failure.error.to_string();
        match failure.reason() {
            FailureReason::InvalidReference => AppError::Validation(message),
            FailureReason::UnsupportedFormat => AppError::UnsupportedFormat(message),
            FailureReason::DocumentNotFound => AppError::NotFound(message),
            FailureReason::NoExtractableText => AppError::UnprocessableEntity(message),
            FailureReason::StorageUnavailable => AppError::Storage(message),
            FailureReason::ScoringUnavailable => AppError::Scoring(message),
            FailureReason::PersistenceError => AppError::Persistence(message),
            FailureReason::Timeout => AppError::Timeout(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                msg.clone(),
            ),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_EXTRACTABLE_TEXT",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "The analysis could not be saved".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    "The document store is unavailable, please retry".to_string(),
                )
            }
            AppError::Scoring(msg) => {
                tracing::error!("Scoring error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SCORING_UNAVAILABLE",
                    "The scoring service is unavailable, please retry".to_string(),
                )
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timeout: {msg}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "The analysis timed out, please retry".to_string(),
                )
            }
            AppError::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                "Server-side result history is disabled".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::orchestrator::AnalysisError;
    use crate::analysis::result::AnalysisState;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_caller_errors_are_4xx() {
        assert_eq!(status_of(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::UnsupportedFormat("x".into())),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::UnprocessableEntity("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_dependency_errors_are_5xx() {
        for err in [
            AppError::Scoring("429".into()),
            AppError::Storage("down".into()),
            AppError::Timeout("slow".into()),
            AppError::Persistence("write".into()),
            AppError::Database(sqlx::Error::PoolTimedOut),
        ] {
            assert!(status_of(err).is_server_error());
        }
    }

    #[test]
    fn test_persistence_failure_without_result_is_500() {
        let failure = AnalysisFailure {
            reference: "user123/1.pdf".to_string(),
            reached: AnalysisState::Scored,
            error: AnalysisError::Persistence(StoreError::Database(sqlx::Error::PoolTimedOut)),
            result: None,
        };
        let err = AppError::from(failure);
        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_5xx_body_hides_upstream_detail() {
        let response =
            AppError::Scoring("API error (status 401): Incorrect API key sk-123".into())
                .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "SCORING_UNAVAILABLE");
        assert!(!json["error"].as_str().unwrap().contains("sk-123"));
    }
}

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use matching_engine::{EngineError, StoreError};
use serde_json::json;
use thiserror::Error;

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_retryable() {
            AppError::ServiceUnavailable(err.to_string())
        } else {
            AppError::InternalError(err.into())
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) if e.is_validation() => AppError::BadRequest(e.to_string()),
            EngineError::Validation(e) => AppError::InternalError(e.into()),
            EngineError::Store(e) => e.into(),
            EngineError::Trade(e) => AppError::InternalError(e.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %msg, "Request failed, store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, msg, "SERVICE_UNAVAILABLE")
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::errors::OrderError;

    #[test]
    fn test_engine_error_mapping() {
        let validation: AppError = EngineError::Validation(OrderError::InvalidPrice("0".into())).into();
        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);

        let terminal: AppError = EngineError::Validation(OrderError::AlreadyTerminal {
            status: "FILLED".into(),
        })
        .into();
        assert_eq!(terminal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let conflict: AppError = EngineError::Store(StoreError::Conflict("aborted".into())).into();
        assert_eq!(conflict.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let corrupt: AppError = EngineError::Store(StoreError::Corrupt("bad row".into())).into();
        assert_eq!(corrupt.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

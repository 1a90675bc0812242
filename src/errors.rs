use crate::{schemas::SchemaError, services::chapter_service::ChapterError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Handler-level error. Every failure a handler can hit collapses into one of
/// these three outcomes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing identifiers or an unusable body (400).
    #[error("{0}")]
    Validation(String),

    /// No caller identity could be resolved (401).
    #[error("Unauthorized")]
    Auth,

    /// Anything else (500). The detail is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ChapterError> for AppError {
    fn from(err: ChapterError) -> Self {
        if let ChapterError::ChapterNotFound { .. } = &err {
            tracing::warn!(error = %err, "target chapter missing");
        }
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Auth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Internal("db gone".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_collapses_into_internal() {
        let err: AppError = ChapterError::ChapterNotFound {
            course_id: "c".into(),
            chapter_id: "x".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

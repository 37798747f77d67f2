//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义（与 HTTP 状态码一致）
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// 上游合成服务失败
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn errno(&self) -> i32 {
        match self {
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadGateway(_) => errno::BAD_GATEWAY,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno, error = %msg, "Bad request");
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(errno, error = %msg, "Resource not found");
            }
            ApiError::BadGateway(msg) => {
                tracing::error!(errno, error = %msg, "Speech synthesis failed");
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno, error = %msg, "Internal server error");
            }
        }

        let body = ErrorResponse::new(errno, self.message());
        (self.status(), Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::SynthesisFailed(_) => ApiError::BadGateway(e.to_string()),
            ApplicationError::StoreWriteFailed(_)
            | ApplicationError::StorageError(_)
            | ApplicationError::RepositoryError(_) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_application_error_mapping() {
        let cases = [
            (ApplicationError::validation("empty"), StatusCode::BAD_REQUEST),
            (ApplicationError::not_found("Question", 9), StatusCode::NOT_FOUND),
            (
                ApplicationError::SynthesisFailed("timeout".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApplicationError::StoreWriteFailed("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApplicationError::StorageError("io".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApplicationError::RepositoryError("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body() {
        let (status, body) =
            body_json(ApiError::from(ApplicationError::not_found("Question", 42))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errno"], 404);
        assert_eq!(body["error"], "Question not found: 42");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_validation_message_is_passed_through() {
        let (status, body) =
            body_json(ApiError::from(ApplicationError::validation("Text is empty"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Text is empty");
    }
}

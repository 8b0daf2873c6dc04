//! Handler-boundary errors. Every variant renders as an error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use zone_types::{ApiResponse, ErrorCode, FieldError, KvStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid API token")]
    InvalidToken,
    #[error("{0}")]
    InvalidRequest(#[from] FieldError),
    #[error("Memory namespace '{0}' not found")]
    MemoryNotFound(String),
    #[error("backing store failure: {0}")]
    Store(#[from] KvStoreError),
    #[error("backing store did not respond within {0:?}")]
    Timeout(Duration),
    #[error("No route for {0}")]
    UnknownRoute(String),
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidToken => ErrorCode::InvalidToken,
            ApiError::InvalidRequest(_)
            | ApiError::UnknownRoute(_)
            | ApiError::MethodNotAllowed(_) => ErrorCode::InvalidRequest,
            ApiError::MemoryNotFound(_) => ErrorCode::MemoryNotFound,
            ApiError::Store(_) | ApiError::Timeout(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MemoryNotFound(_) | ApiError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(_) | ApiError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(code = %self.code(), error = %self, "request rejected");
        }
        let body: ApiResponse<()> = ApiResponse::error(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gdrag_index::IndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Handler failure, rendered as `{"detail": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::InvalidChunking { .. } | IndexError::InvalidPath(_) => {
                Self::BadRequest(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<gdrag_store::VectorStoreError> for ApiError {
    fn from(e: gdrag_store::VectorStoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

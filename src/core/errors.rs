use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the acquisition and retrieval pipeline.
///
/// Fetch/Parse/IndexWrite/IndexQuery are recovered close to where they
/// occur and never abort a batch; Generation propagates to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("index write failed: {0}")]
    IndexWrite(String),
    #[error("index query failed: {0}")]
    IndexQuery(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("invalid chunking parameters: {0}")]
    InvalidChunking(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::InvalidChunking(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Fetch(_)
            | ApiError::IndexWrite(_)
            | ApiError::IndexQuery(_)
            | ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
            ApiError::Parse(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

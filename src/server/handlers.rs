use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::core::errors::ApiError;
use crate::index::SourceKind;
use crate::ingest::IngestReport;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestWebRequest {
    pub tenant: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestDocumentRequest {
    pub tenant: String,
    pub kind: SourceKind,
    /// Identifier of the source the adapter extracted from (file name,
    /// repository URL).
    pub source: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub tenant: String,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ingest_web(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestWebRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    if request.tenant.trim().is_empty() {
        return Err(ApiError::BadRequest("tenant must not be empty".into()));
    }
    let seed = Url::parse(&request.url)
        .map_err(|e| ApiError::BadRequest(format!("invalid seed url: {e}")))?;
    if !matches!(seed.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest("seed url must be http(s)".into()));
    }

    let report = state.ingestor.ingest_web(&request.tenant, &seed).await?;
    Ok(Json(report))
}

pub async fn ingest_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestDocumentRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    if request.tenant.trim().is_empty() {
        return Err(ApiError::BadRequest("tenant must not be empty".into()));
    }

    let report = state
        .ingestor
        .ingest_document(&request.tenant, request.kind, &request.source, &request.text)
        .await?;
    Ok(Json(report))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.tenant.trim().is_empty() {
        return Err(ApiError::BadRequest("tenant must not be empty".into()));
    }

    let response = state.chat.answer(&request.tenant, &request.query).await?;
    Ok(Json(ChatResponse { response }))
}

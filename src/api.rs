use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Query, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::digest;
use crate::error::ApiError;
use crate::ingest::{self, IngestOutcome};
use crate::store::{DigestStore, InMemoryDigestStore, SummarizedRecord};
use crate::summarize::Summarizer;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub store: Arc<dyn DigestStore>,
}

impl AppState {
    pub fn new(summarizer: Arc<Summarizer>, store: Arc<dyn DigestStore>) -> Self {
        Self { summarizer, store }
    }

    /// Fresh, empty in-memory store around the given summarizer.
    pub fn with_summarizer(summarizer: Summarizer) -> Self {
        Self::new(Arc::new(summarizer), Arc::new(InMemoryDigestStore::new()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ingest", post(ingest_items))
        .route("/digest", get(get_digest))
        .route("/summarize", post(summarize_one))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn ingest_items(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let out = ingest::ingest(payload, &state.summarizer, state.store.as_ref()).await?;
    Ok(Json(out))
}

#[derive(Debug, Deserialize)]
struct DigestQuery {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DigestResponse {
    pub summaries: Vec<SummarizedRecord>,
}

async fn get_digest(
    State(state): State<AppState>,
    Query(q): Query<DigestQuery>,
) -> Json<DigestResponse> {
    let summaries = digest::digest(state.store.as_ref(), q.category.as_deref());
    Json(DigestResponse { summaries })
}

#[derive(Debug, Deserialize)]
struct SummarizeReq {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResp {
    pub summary: String,
}

/// Accepts `{"text": ...}` or a urlencoded form field `text`.
async fn summarize_one(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<SummarizeResp>, ApiError> {
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    let body = if is_form {
        let Form(body) = Form::<SummarizeReq>::from_request(req, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        body
    } else {
        let Json(body) = Json::<SummarizeReq>::from_request(req, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        body
    };

    tracing::debug!(
        target: "summarize",
        id = %ingest::anon_hash(&body.text),
        chars = body.text.chars().count(),
        "ad hoc summarize"
    );
    let summary = state.summarizer.summarize_text(&body.text).await?;
    Ok(Json(SummarizeResp { summary }))
}

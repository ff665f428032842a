// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod store;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::{ApiError, IngestError, SummarizeError};
pub use crate::store::{DigestStore, InMemoryDigestStore, SummarizedRecord};
pub use crate::summarize::{GenerationParams, SummarizationEngine, Summarizer};

use axum::Router;
use tracing::info;

/// Build the full in-process app from env/config: API routes plus `/metrics`.
/// Used by the binary and by tests that want the production wiring.
pub async fn app() -> anyhow::Result<Router> {
    let _ = dotenvy::dotenv();

    let runtime = bootstrap::SummarizerRuntime::from_env()?;
    if std::env::var("SUMMARIZER_PROBE").ok().as_deref() == Some("1") {
        runtime.quick_probe().await;
    }

    let store = std::sync::Arc::new(InMemoryDigestStore::new());
    let state = AppState::new(runtime.summarizer, store);
    let metrics = metrics::Metrics::init()?;
    info!(engine = state.summarizer.engine_name(), "news digest app ready");

    Ok(router(state).merge(metrics.router::<()>()))
}

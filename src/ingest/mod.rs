// src/ingest/mod.rs
pub mod normalize;
pub mod types;

use metrics::{counter, gauge};
use serde_json::Value;

use crate::error::IngestError;
use crate::store::{DigestStore, SummarizedRecord};
use crate::summarize::Summarizer;

pub use normalize::{normalize, WRAPPER_KEY};
pub use types::{IngestOutcome, RawIngestItem};

/// Short, non-reversible id for log lines; raw text is never logged.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Build the stored record. Headline and content are dropped here.
pub fn to_record(item: RawIngestItem, summary: String) -> SummarizedRecord {
    SummarizedRecord {
        source: item.source,
        category: item.category,
        url: item.url,
        timestamp: item.timestamp,
        summary,
    }
}

/// Normalize → summarize (one engine call) → append. The store is only touched
/// after inference succeeded, so a failed request leaves it unchanged.
pub async fn ingest(
    payload: Value,
    summarizer: &Summarizer,
    store: &dyn DigestStore,
) -> Result<IngestOutcome, IngestError> {
    crate::metrics::ensure_described();
    counter!("ingest_requests_total").increment(1);

    let result = run(payload, summarizer, store).await;
    if let Err(e) = &result {
        counter!("ingest_failures_total", "kind" => e.kind()).increment(1);
        tracing::warn!(target: "ingest", kind = e.kind(), error = %e, "ingest rejected");
    }
    result
}

async fn run(
    payload: Value,
    summarizer: &Summarizer,
    store: &dyn DigestStore,
) -> Result<IngestOutcome, IngestError> {
    let items = normalize(payload)?;
    if items.is_empty() {
        return Ok(IngestOutcome::success(Vec::new()));
    }

    let texts: Vec<String> = items
        .iter()
        .map(|i| i.summarization_text().to_string())
        .collect();
    let summaries = summarizer.summarize_batch(&texts).await?;

    let batch_id = anon_hash(
        &items
            .iter()
            .map(|i| i.url.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    );
    let records: Vec<SummarizedRecord> = items
        .into_iter()
        .zip(summaries.iter().cloned())
        .map(|(item, summary)| to_record(item, summary))
        .collect();
    store.extend(records);

    let now = chrono::Utc::now().timestamp().max(0);
    counter!("ingest_items_total").increment(summaries.len() as u64);
    gauge!("digest_store_records").set(store.len() as f64);
    gauge!("ingest_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        %batch_id,
        received = summaries.len(),
        engine = summarizer.engine_name(),
        "ingested batch"
    );
    Ok(IngestOutcome::success(summaries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDigestStore;
    use crate::summarize::{GenerationParams, MockEngine};
    use serde_json::json;
    use std::sync::Arc;

    fn summarizer(engine: Arc<MockEngine>) -> Summarizer {
        Summarizer::new(engine, GenerationParams::default())
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        assert_eq!(anon_hash("abc"), anon_hash("abc"));
        assert_eq!(anon_hash("abc").len(), 12);
        assert_ne!(anon_hash("abc"), anon_hash("abd"));
    }

    #[test]
    fn summarization_text_falls_back_to_headline() {
        let mut item = RawIngestItem {
            source: "s".into(),
            category: "c".into(),
            headline: "H".into(),
            url: "u".into(),
            timestamp: "t".into(),
            content: None,
        };
        assert_eq!(item.summarization_text(), "H");
        item.content = Some("   ".into());
        assert_eq!(item.summarization_text(), "H");
        item.content = Some("C".into());
        assert_eq!(item.summarization_text(), "C");
    }

    #[tokio::test]
    async fn zero_items_skip_engine_and_store() {
        let engine = Arc::new(MockEngine::new());
        let store = InMemoryDigestStore::new();
        let out = ingest(json!([]), &summarizer(engine.clone()), &store)
            .await
            .unwrap();
        assert_eq!(out, IngestOutcome::success(vec![]));
        assert_eq!(engine.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn engine_failure_appends_nothing() {
        let engine = Arc::new(MockEngine::failing("cuda out of memory"));
        let store = InMemoryDigestStore::new();
        let payload = json!([{
            "source": "s", "category": "c", "headline": "h",
            "url": "u", "timestamp": "2024-01-01T00:00:00Z"
        }]);
        let err = ingest(payload, &summarizer(engine), &store)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "inference_error");
        assert!(store.is_empty());
    }
}

use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_requests_total", "Ingest requests received.");
        describe_counter!("ingest_items_total", "Items summarized and stored.");
        describe_counter!(
            "ingest_failures_total",
            "Ingest requests rejected, labelled by error kind."
        );
        describe_counter!("summarize_batches_total", "Engine batch calls that succeeded.");
        describe_counter!("summarize_texts_total", "Texts summarized by the engine.");
        describe_counter!(
            "summarize_failures_total",
            "Batch summarizations that failed, labelled by error kind."
        );
        describe_histogram!("summarize_duration_ms", "Engine batch latency in milliseconds.");
        describe_counter!("digest_requests_total", "Digest queries served.");
        describe_gauge!("digest_store_records", "Records currently held by the digest store.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts of the last successful ingest."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder once; later calls reuse it.
    pub fn init() -> anyhow::Result<&'static Self> {
        static METRICS: OnceCell<Metrics> = OnceCell::new();
        METRICS.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
            ensure_described();
            Ok(Self { handle })
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

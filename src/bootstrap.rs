// src/bootstrap.rs
use crate::config::SummarizerConfig;
use crate::summarize::{build_engine, Summarizer};
use std::sync::Arc;
use tracing::{info, warn};

/// Process-start wiring of config → engine → orchestrator.
pub struct SummarizerRuntime {
    pub cfg: SummarizerConfig,
    pub summarizer: Arc<Summarizer>,
}

impl SummarizerRuntime {
    pub fn from_config(cfg: SummarizerConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: never log the token itself
        info!(
            "summarizer cfg loaded: model={}, backend={:?}, device={}, endpoint={}, token_len={}, timeout_ms={}",
            cfg.model,
            cfg.backend,
            cfg.device.resolve().as_str(),
            cfg.endpoint,
            cfg.api_token.len(),
            cfg.timeout_ms
        );
        let engine = build_engine(&cfg)?;
        let summarizer = Arc::new(Summarizer::from_config(&cfg, engine));
        Ok(Self { cfg, summarizer })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_config(SummarizerConfig::from_env()?)
    }

    /// One-off smoke summarization. Never fails startup; just logs the outcome.
    pub async fn quick_probe(&self) {
        let sample = "The city council approved a new budget on Tuesday that increases funding \
                      for public transit and road repairs while keeping property taxes flat.";
        match self.summarizer.summarize_text(sample).await {
            Ok(s) => info!(chars = s.len(), "summarizer quick_probe ok"),
            Err(e) => warn!(error = %e, "summarizer quick_probe failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    #[tokio::test]
    async fn runtime_keeps_config_and_wires_matching_summarizer() {
        let cfg = SummarizerConfig {
            model: "facebook/bart-large-cnn".into(),
            backend: Backend::Mock,
            ..Default::default()
        };
        let runtime = SummarizerRuntime::from_config(cfg).unwrap();
        assert_eq!(runtime.cfg.backend, Backend::Mock);
        assert_eq!(
            runtime.summarizer.params().max_input_tokens,
            runtime.cfg.max_input_tokens()
        );
        assert_eq!(runtime.summarizer.engine_name(), "mock");

        let out = runtime.summarizer.summarize_text("Rates held steady").await.unwrap();
        assert_eq!(out, "Summary: Rates held steady");
    }
}

// src/summarize/mod.rs
//! Summarization boundary: engine abstraction, generation contract and the batch
//! orchestration that every ingest/summarize request goes through.

pub mod mock;
pub mod remote;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::{Backend, SummarizerConfig};
use crate::error::SummarizeError;

pub use mock::{DisabledEngine, MockEngine};
pub use remote::RemoteEngine;

/// Coarse character ceiling applied before submission, per input token of the window.
/// The engine's tokenizer performs the exact sub-word truncation.
const MAX_CHARS_PER_TOKEN: usize = 8;

/// Decoding parameters sent with every generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
    pub num_beams: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: usize,
    /// Inputs longer than this many sub-word tokens are cut silently.
    pub max_input_tokens: usize,
    pub truncation: bool,
    pub skip_special_tokens: bool,
    pub clean_up_tokenization_spaces: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_length: 60,
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
            no_repeat_ngram_size: 2,
            max_input_tokens: 512,
            truncation: true,
            skip_special_tokens: true,
            clean_up_tokenization_spaces: true,
        }
    }
}

impl GenerationParams {
    pub fn with_max_input_tokens(mut self, n: usize) -> Self {
        self.max_input_tokens = n;
        self
    }
}

/// A frozen seq2seq model plus tokenizer. One call handles a whole batch.
#[async_trait]
pub trait SummarizationEngine: Send + Sync {
    /// Summarize `inputs` in order. Implementations must return one output per input
    /// or an error; the orchestrator verifies the length either way.
    async fn summarize_many(
        &self,
        inputs: &[String],
        params: &GenerationParams,
    ) -> Result<Vec<String>, SummarizeError>;

    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynEngine = Arc<dyn SummarizationEngine>;

/// Factory: build an engine according to config.
pub fn build_engine(cfg: &SummarizerConfig) -> anyhow::Result<DynEngine> {
    let engine: DynEngine = match cfg.backend {
        Backend::Remote => Arc::new(RemoteEngine::from_config(cfg)?),
        Backend::Mock => Arc::new(MockEngine::new()),
        Backend::Disabled => Arc::new(DisabledEngine),
    };
    Ok(engine)
}

/// Batch orchestration around an engine: input hygiene, a single engine call per
/// batch under a timeout, output length check and decode cleanup.
pub struct Summarizer {
    engine: DynEngine,
    params: GenerationParams,
    task_prefix: Option<String>,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(engine: DynEngine, params: GenerationParams) -> Self {
        Self {
            engine,
            params,
            task_prefix: None,
            timeout: Duration::from_millis(crate::config::summarizer::DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn from_config(cfg: &SummarizerConfig, engine: DynEngine) -> Self {
        let params = GenerationParams::default().with_max_input_tokens(cfg.max_input_tokens());
        let mut s = Self::new(engine, params).with_timeout(Duration::from_millis(cfg.timeout_ms));
        s.task_prefix = cfg.task_prefix().map(str::to_string);
        s
    }

    pub fn with_task_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.task_prefix = Some(prefix.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Strip, validate, cap and prefix every text. Fails on the first text that is
    /// empty after stripping, so the engine never sees a degenerate batch.
    pub fn prepare_inputs(&self, texts: &[String]) -> Result<Vec<String>, SummarizeError> {
        let max_chars = self.params.max_input_tokens.saturating_mul(MAX_CHARS_PER_TOKEN);
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| {
                let stripped = t.trim();
                if stripped.is_empty() {
                    return Err(SummarizeError::EmptyInput { index });
                }
                let capped = truncate_chars(stripped, max_chars);
                Ok(match &self.task_prefix {
                    Some(p) => format!("{p}{capped}"),
                    None => capped.to_string(),
                })
            })
            .collect()
    }

    /// One summary per input text, same order. Any failure fails the whole batch.
    pub async fn summarize_batch(&self, texts: &[String]) -> Result<Vec<String>, SummarizeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        crate::metrics::ensure_described();

        let result = self.run_batch(texts).await;
        match &result {
            Ok(out) => {
                counter!("summarize_batches_total").increment(1);
                counter!("summarize_texts_total").increment(out.len() as u64);
            }
            Err(e) => {
                counter!("summarize_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(
                    target: "summarize",
                    engine = self.engine.name(),
                    batch = texts.len(),
                    error = %e,
                    "batch summarization failed"
                );
            }
        }
        result
    }

    async fn run_batch(&self, texts: &[String]) -> Result<Vec<String>, SummarizeError> {
        let inputs = self.prepare_inputs(texts)?;

        let started = Instant::now();
        let raw = tokio::time::timeout(
            self.timeout,
            self.engine.summarize_many(&inputs, &self.params),
        )
        .await
        .map_err(|_| SummarizeError::Timeout(self.timeout))??;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("summarize_duration_ms").record(elapsed_ms);

        if raw.len() != inputs.len() {
            return Err(SummarizeError::LengthMismatch {
                expected: inputs.len(),
                got: raw.len(),
            });
        }

        let mut out = Vec::with_capacity(raw.len());
        for (i, s) in raw.iter().enumerate() {
            let cleaned = clean_decoded(s);
            if cleaned.is_empty() {
                return Err(SummarizeError::Engine(format!(
                    "empty summary produced for input #{i}"
                )));
            }
            out.push(cleaned);
        }

        tracing::debug!(
            target: "summarize",
            engine = self.engine.name(),
            batch = out.len(),
            elapsed_ms,
            "batch summarized"
        );
        Ok(out)
    }

    /// Ad hoc single-text variant; same contract as a batch of one.
    pub async fn summarize_text(&self, text: &str) -> Result<String, SummarizeError> {
        let mut out = self.summarize_batch(&[text.to_string()]).await?;
        out.pop().ok_or(SummarizeError::LengthMismatch {
            expected: 1,
            got: 0,
        })
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

static RE_SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?s>|<pad>|<unk>|<mask>|<extra_id_\d+>").expect("special token regex")
});
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Tokenizer-side cleanup: drop special tokens, collapse whitespace and undo the
/// spaces sub-word decoding leaves before punctuation and contractions.
pub fn clean_decoded(raw: &str) -> String {
    let out = RE_SPECIAL.replace_all(raw, " ");
    let mut out = RE_WS.replace_all(&out, " ").trim().to_string();
    for (from, to) in [
        (" .", "."),
        (" ?", "?"),
        (" !", "!"),
        (" ,", ","),
        (" ' ", "'"),
        (" n't", "n't"),
        (" 'm", "'m"),
        (" 's", "'s"),
        (" 've", "'ve"),
        (" 're", "'re"),
    ] {
        out = out.replace(from, to);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_decoded_strips_specials_and_spacing() {
        let s = "<pad> the fed held rates steady . markets did n't move much </s>";
        assert_eq!(
            clean_decoded(s),
            "the fed held rates steady. markets didn't move much"
        );
    }

    #[test]
    fn clean_decoded_of_only_specials_is_empty() {
        assert_eq!(clean_decoded("<pad></s>  "), "");
    }

    #[test]
    fn default_params_match_generation_contract() {
        let p = GenerationParams::default();
        assert_eq!((p.min_length, p.max_length), (20, 60));
        assert_eq!(p.num_beams, 4);
        assert_eq!(p.length_penalty, 2.0);
        assert!(p.early_stopping);
        assert_eq!(p.no_repeat_ngram_size, 2);
        assert!(p.truncation && p.skip_special_tokens && p.clean_up_tokenization_spaces);
    }

    #[test]
    fn prepare_inputs_strips_and_prefixes() {
        let s = Summarizer::new(Arc::new(MockEngine::new()), GenerationParams::default())
            .with_task_prefix("summarize: ");
        let out = s
            .prepare_inputs(&["  Stocks rally  ".to_string(), "\nRain\t".to_string()])
            .unwrap();
        assert_eq!(out, vec!["summarize: Stocks rally", "summarize: Rain"]);
    }

    #[test]
    fn prepare_inputs_rejects_blank_text_with_index() {
        let s = Summarizer::new(Arc::new(MockEngine::new()), GenerationParams::default());
        let err = s
            .prepare_inputs(&["ok".to_string(), "   ".to_string()])
            .unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyInput { index: 1 }));
    }

    #[test]
    fn prepare_inputs_caps_very_long_text_silently() {
        let params = GenerationParams::default().with_max_input_tokens(4);
        let s = Summarizer::new(Arc::new(MockEngine::new()), params);
        let long = "é".repeat(1_000);
        let out = s.prepare_inputs(&[long]).unwrap();
        assert_eq!(out[0].chars().count(), 4 * MAX_CHARS_PER_TOKEN);
    }
}

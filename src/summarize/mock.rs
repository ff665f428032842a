// src/summarize/mock.rs
//! Deterministic engines for tests and local runs without a model server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{GenerationParams, SummarizationEngine};
use crate::error::SummarizeError;

#[derive(Debug, Clone)]
enum Mode {
    Echo,
    Fail(String),
    Scripted(Vec<String>),
}

/// Returns canned summaries derived from the input ("Summary: <leading words>").
/// Records every batch it receives so tests can inspect what was submitted.
#[derive(Debug)]
pub struct MockEngine {
    mode: Mode,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<String>>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::with_mode(Mode::Echo)
    }

    /// Every call fails with the given engine message.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with_mode(Mode::Fail(msg.into()))
    }

    /// Every call returns exactly `outputs`, whatever the batch size.
    pub fn scripted(outputs: Vec<String>) -> Self {
        Self::with_mode(Mode::Scripted(outputs))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Simulate slow inference.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of engine invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inputs of the most recent invocation.
    pub fn last_inputs(&self) -> Option<Vec<String>> {
        self.seen.lock().expect("mock engine mutex poisoned").last().cloned()
    }

    /// Canned summary for one (already prefixed) input.
    pub fn canned_summary(input: &str) -> String {
        let body = input.strip_prefix("summarize: ").unwrap_or(input);
        let words: Vec<&str> = body.split_whitespace().take(12).collect();
        format!("Summary: {}", words.join(" "))
    }
}

#[async_trait]
impl SummarizationEngine for MockEngine {
    async fn summarize_many(
        &self,
        inputs: &[String],
        _params: &GenerationParams,
    ) -> Result<Vec<String>, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("mock engine mutex poisoned")
            .push(inputs.to_vec());

        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }

        match &self.mode {
            Mode::Fail(msg) => Err(SummarizeError::Engine(msg.clone())),
            Mode::Scripted(out) => Ok(out.clone()),
            Mode::Echo => inputs
                .iter()
                .map(|t| {
                    if t.trim().is_empty() {
                        Err(SummarizeError::Engine("empty input sequence".into()))
                    } else {
                        Ok(Self::canned_summary(t))
                    }
                })
                .collect(),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Always fails with `Disabled`; used when no backend is configured.
pub struct DisabledEngine;

#[async_trait]
impl SummarizationEngine for DisabledEngine {
    async fn summarize_many(
        &self,
        _inputs: &[String],
        _params: &GenerationParams,
    ) -> Result<Vec<String>, SummarizeError> {
        Err(SummarizeError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_mode_is_deterministic_and_ordered() {
        let engine = MockEngine::new();
        let params = GenerationParams::default();
        let inputs = vec![
            "summarize: Fed holds rates".to_string(),
            "summarize: Team wins final".to_string(),
        ];
        let out = engine.summarize_many(&inputs, &params).await.unwrap();
        assert_eq!(out, vec!["Summary: Fed holds rates", "Summary: Team wins final"]);
        assert_eq!(engine.calls(), 1);
        assert_eq!(engine.last_inputs(), Some(inputs));
    }

    #[test]
    fn canned_summary_keeps_first_twelve_words() {
        let long: Vec<String> = (1..=20).map(|i| format!("w{i}")).collect();
        let out = MockEngine::canned_summary(&format!("summarize: {}", long.join(" ")));
        assert_eq!(out, format!("Summary: {}", long[..12].join(" ")));
    }

    #[tokio::test]
    async fn disabled_engine_refuses() {
        let err = DisabledEngine
            .summarize_many(&["x".to_string()], &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Disabled));
    }
}

// src/summarize/remote.rs
//! HTTP client for a model server hosting the seq2seq checkpoint.
//!
//! Wire contract: `POST {endpoint}/summarize`
//! `{"model", "device", "inputs": [...], "parameters": {...}}` → `{"summaries": [...]}`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GenerationParams, SummarizationEngine};
use crate::config::{Device, SummarizerConfig};
use crate::error::SummarizeError;

pub struct RemoteEngine {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
    model: String,
    device: Device,
}

impl RemoteEngine {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        device: Device,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()
            .context("building inference http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_token: String::new(),
            model: model.into(),
            device: device.resolve(),
        })
    }

    pub fn from_config(cfg: &SummarizerConfig) -> anyhow::Result<Self> {
        let mut engine = Self::new(cfg.endpoint.clone(), cfg.model.clone(), cfg.device)?;
        engine.api_token = cfg.api_token.clone();
        Ok(engine)
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = token.into();
        self
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    device: &'a str,
    inputs: &'a [String],
    parameters: &'a GenerationParams,
}

#[derive(Deserialize)]
struct Resp {
    summaries: Vec<String>,
}

#[async_trait]
impl SummarizationEngine for RemoteEngine {
    async fn summarize_many(
        &self,
        inputs: &[String],
        params: &GenerationParams,
    ) -> Result<Vec<String>, SummarizeError> {
        let req = Req {
            model: &self.model,
            device: self.device.as_str(),
            inputs,
            parameters: params,
        };

        let mut builder = self
            .http
            .post(format!("{}/summarize", self.endpoint))
            .json(&req);
        if !self.api_token.is_empty() {
            builder = builder.bearer_auth(&self.api_token);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| SummarizeError::Engine(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(SummarizeError::Engine(format!(
                "model server returned {status}: {}",
                snippet.trim()
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| SummarizeError::Engine(format!("malformed model server reply: {e}")))?;
        Ok(body.summaries)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

// src/error.rs
//! Request-level error taxonomy shared by the ingest, digest and summarize paths.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures raised while turning texts into summaries.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("input #{index} is empty after trimming whitespace")]
    EmptyInput { index: usize },
    #[error("summarization engine failed: {0}")]
    Engine(String),
    #[error("summarization engine returned {got} summaries for {expected} inputs")]
    LengthMismatch { expected: usize, got: usize },
    #[error("summarization engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("summarization engine is disabled")]
    Disabled,
}

impl SummarizeError {
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::EmptyInput { .. } => "empty_input",
            SummarizeError::Engine(_) => "inference_error",
            SummarizeError::LengthMismatch { .. } => "inference_error",
            SummarizeError::Timeout(_) => "inference_timeout",
            SummarizeError::Disabled => "engine_disabled",
        }
    }
}

/// Failures of a single ingestion request. The whole request fails on either variant.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{}", validation_message(.index, .message))]
    Validation {
        index: Option<usize>,
        message: String,
    },
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
}

fn validation_message(index: &Option<usize>, message: &str) -> String {
    match index {
        Some(i) => format!("item #{i}: {message}"),
        None => message.to_string(),
    }
}

impl IngestError {
    pub fn validation(index: Option<usize>, message: impl Into<String>) -> Self {
        IngestError::Validation {
            index,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Validation { .. } => "validation_error",
            IngestError::Summarize(e) => e.kind(),
        }
    }
}

/// Error surfaced by HTTP handlers as `{"error": {"kind", "message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Ingest(e) => e.kind(),
            ApiError::Summarize(e) => e.kind(),
            ApiError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            "validation_error" | "empty_input" => StatusCode::UNPROCESSABLE_ENTITY,
            "inference_timeout" => StatusCode::GATEWAY_TIMEOUT,
            "engine_disabled" => StatusCode::SERVICE_UNAVAILABLE,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'a str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

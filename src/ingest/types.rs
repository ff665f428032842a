// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// Untrusted item as submitted by a collector. Every field except `content`
/// must be present and non-null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIngestItem {
    pub source: String,    // e.g., "Reuters", "r/worldnews"
    pub category: String,  // e.g., "Tech", "Politics"
    pub headline: String,
    pub url: String,
    pub timestamp: String, // ISO-8601, kept verbatim
    #[serde(default)]
    pub content: Option<String>,
}

impl RawIngestItem {
    /// Text handed to the summarizer: non-blank `content`, else the headline.
    pub fn summarization_text(&self) -> &str {
        match self.content.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => &self.headline,
        }
    }
}

/// Envelope returned to the collector after a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub status: String,
    pub received: usize,
    pub summaries: Vec<String>,
}

impl IngestOutcome {
    pub fn success(summaries: Vec<String>) -> Self {
        Self {
            status: "success".to_string(),
            received: summaries.len(),
            summaries,
        }
    }
}

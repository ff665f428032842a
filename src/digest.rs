// src/digest.rs
//! Category-filtered, recency-sorted view of the store.
//!
//! Ordering compares `timestamp` as a plain string, which is chronological only
//! for zero-padded ISO-8601 values written in one timezone notation.

use metrics::counter;

use crate::store::{DigestStore, SummarizedRecord};

/// Maximum number of records a digest returns.
pub const DIGEST_LIMIT: usize = 5;

/// Category value meaning "no filter" (case-insensitive).
pub const ALL_CATEGORIES: &str = "all";

/// `None`, blank and "all" all mean no filtering. Any other value is returned
/// untouched: surrounding whitespace is part of the category.
fn effective_category(category: Option<&str>) -> Option<&str> {
    category.filter(|c| {
        let c = c.trim();
        !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES)
    })
}

fn category_matches(record: &SummarizedRecord, wanted: &str) -> bool {
    record.category.to_lowercase() == wanted.to_lowercase()
}

/// Pure selection over an already materialized record list.
pub fn select_digest(
    records: Vec<SummarizedRecord>,
    category: Option<&str>,
    limit: usize,
) -> Vec<SummarizedRecord> {
    let mut out: Vec<SummarizedRecord> = match effective_category(category) {
        Some(c) => records
            .into_iter()
            .filter(|r| category_matches(r, c))
            .collect(),
        None => records,
    };
    // Stable: equal timestamps keep insertion order.
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out.truncate(limit);
    out
}

/// Top `DIGEST_LIMIT` records for `category`, newest first. Never errors.
pub fn digest(store: &dyn DigestStore, category: Option<&str>) -> Vec<SummarizedRecord> {
    crate::metrics::ensure_described();
    counter!("digest_requests_total").increment(1);

    let wanted = effective_category(category);
    let candidates = match wanted {
        Some(c) => store.filtered(&|r: &SummarizedRecord| category_matches(r, c)),
        None => store.snapshot(),
    };
    let out = select_digest(candidates, wanted, DIGEST_LIMIT);

    tracing::debug!(
        target: "digest",
        category = wanted.unwrap_or(ALL_CATEGORIES),
        returned = out.len(),
        "digest served"
    );
    out
}

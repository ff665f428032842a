//! store.rs — append-only, process-lifetime collection of summarized records.
//!
//! Synchronization: a single `RwLock` around the vector. Writers hold the write
//! lock only for the push itself, so a record is either fully visible or not
//! visible at all. Readers clone what they need and release the lock before
//! sorting. Nothing slow (inference, I/O) ever runs under the lock.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Stored entity. Never carries the original headline or content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedRecord {
    pub source: String,
    pub category: String,
    pub url: String,
    /// ISO-8601 as received; not parsed.
    pub timestamp: String,
    pub summary: String,
}

/// Injectable store seam used by the ingest and digest paths.
pub trait DigestStore: Send + Sync {
    fn append(&self, record: SummarizedRecord);

    /// Append a whole request's records in order. The default appends one at a
    /// time; implementations override it to publish the batch under one lock.
    fn extend(&self, records: Vec<SummarizedRecord>) {
        for r in records {
            self.append(r);
        }
    }

    /// Insertion-ordered copy of the current contents.
    fn snapshot(&self) -> Vec<SummarizedRecord>;

    /// Insertion-ordered copy of the records accepted by `keep`.
    fn filtered(&self, keep: &dyn Fn(&SummarizedRecord) -> bool) -> Vec<SummarizedRecord> {
        self.snapshot().into_iter().filter(|r| keep(r)).collect()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDigestStore {
    inner: RwLock<Vec<SummarizedRecord>>,
    /// Optional retention cap; oldest records are dropped first.
    cap: Option<usize>,
}

impl InMemoryDigestStore {
    /// Unbounded store (the production default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that keeps at most `cap` most recently appended records.
    pub fn bounded(cap: usize) -> Self {
        Self {
            inner: RwLock::new(Vec::with_capacity(cap.min(10_000))),
            cap: Some(cap),
        }
    }

    fn enforce_cap(&self, v: &mut Vec<SummarizedRecord>) {
        if let Some(cap) = self.cap {
            if v.len() > cap {
                let excess = v.len() - cap;
                v.drain(0..excess);
            }
        }
    }
}

impl DigestStore for InMemoryDigestStore {
    fn append(&self, record: SummarizedRecord) {
        let mut v = self.inner.write().expect("digest store lock poisoned");
        v.push(record);
        self.enforce_cap(&mut v);
    }

    fn extend(&self, records: Vec<SummarizedRecord>) {
        if records.is_empty() {
            return;
        }
        let mut v = self.inner.write().expect("digest store lock poisoned");
        v.extend(records);
        self.enforce_cap(&mut v);
    }

    fn snapshot(&self) -> Vec<SummarizedRecord> {
        self.inner.read().expect("digest store lock poisoned").clone()
    }

    fn filtered(&self, keep: &dyn Fn(&SummarizedRecord) -> bool) -> Vec<SummarizedRecord> {
        let v = self.inner.read().expect("digest store lock poisoned");
        v.iter().filter(|r| keep(*r)).cloned().collect()
    }

    fn len(&self) -> usize {
        self.inner.read().expect("digest store lock poisoned").len()
    }
}

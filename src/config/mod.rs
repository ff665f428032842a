// src/config/mod.rs
pub mod summarizer;

pub use summarizer::{Backend, Device, SummarizerConfig};

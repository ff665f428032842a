// tests/summarize_batch.rs
use std::sync::Arc;
use std::time::Duration;

use news_digest::summarize::MockEngine;
use news_digest::{GenerationParams, SummarizeError, Summarizer};

fn texts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Story number {i} about the economy")).collect()
}

#[tokio::test]
async fn returns_one_summary_per_input_in_order() {
    let engine = Arc::new(MockEngine::new());
    let s = Summarizer::new(engine.clone(), GenerationParams::default());

    let out = s.summarize_batch(&texts(4)).await.unwrap();

    assert_eq!(out.len(), 4);
    for (i, summary) in out.iter().enumerate() {
        assert!(summary.contains(&format!("number {i}")), "{summary}");
    }
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn empty_batch_does_not_call_engine() {
    let engine = Arc::new(MockEngine::new());
    let s = Summarizer::new(engine.clone(), GenerationParams::default());
    assert!(s.summarize_batch(&[]).await.unwrap().is_empty());
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn short_engine_output_is_an_error_not_a_shorter_result() {
    let engine = Arc::new(MockEngine::scripted(vec!["only one".into()]));
    let s = Summarizer::new(engine, GenerationParams::default());

    let err = s.summarize_batch(&texts(3)).await.unwrap_err();
    assert!(matches!(
        err,
        SummarizeError::LengthMismatch {
            expected: 3,
            got: 1
        }
    ));
}

#[tokio::test]
async fn decoded_output_is_cleaned() {
    let engine = Arc::new(MockEngine::scripted(vec![
        "<pad> rates stay put . investors shrug </s>".into(),
    ]));
    let s = Summarizer::new(engine, GenerationParams::default());
    let out = s.summarize_text("Fed decision").await.unwrap();
    assert_eq!(out, "rates stay put. investors shrug");
}

#[tokio::test]
async fn blank_summary_from_engine_fails_batch() {
    let engine = Arc::new(MockEngine::scripted(vec!["ok".into(), "</s>".into()]));
    let s = Summarizer::new(engine, GenerationParams::default());
    let err = s.summarize_batch(&texts(2)).await.unwrap_err();
    assert_eq!(err.kind(), "inference_error");
}

#[tokio::test]
async fn slow_engine_hits_timeout() {
    let engine = Arc::new(MockEngine::new().with_delay(Duration::from_millis(200)));
    let s = Summarizer::new(engine, GenerationParams::default())
        .with_timeout(Duration::from_millis(20));

    let err = s.summarize_text("anything").await.unwrap_err();
    assert!(matches!(err, SummarizeError::Timeout(_)));
    assert_eq!(err.kind(), "inference_timeout");
}

#[tokio::test]
async fn single_text_variant_matches_batch_of_one() {
    let s = Summarizer::new(Arc::new(MockEngine::new()), GenerationParams::default());
    let one = s.summarize_text("Bridge reopens after repairs").await.unwrap();
    let batch = s
        .summarize_batch(&["Bridge reopens after repairs".to_string()])
        .await
        .unwrap();
    assert_eq!(vec![one], batch);
}

#[tokio::test]
async fn engine_receives_generation_contract() {
    let s = Summarizer::new(Arc::new(MockEngine::new()), GenerationParams::default());
    let p = s.params();
    assert_eq!(p.min_length, 20);
    assert_eq!(p.max_length, 60);
    assert_eq!(p.num_beams, 4);
    assert_eq!(p.no_repeat_ngram_size, 2);
    assert_eq!(p.max_input_tokens, 512);
}

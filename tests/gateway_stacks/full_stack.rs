//! Text and streaming through the whole pipeline.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::StreamExt;
use modelgate_core::{OpKind, TextRequest};
use modelgate_healthcheck::HealthRegistry;
use modelgate_metrics::MetricsRegistry;

use super::test_utils::{full_stack, Mock};

#[tokio::test]
async fn text_flows_through_the_whole_stack() {
    let metrics = Arc::new(MetricsRegistry::new());
    let health = Arc::new(HealthRegistry::new());
    let (mock, calls) = Mock::new("primary");
    let gateway = full_stack(mock.failing_first(1), Arc::clone(&metrics), Arc::clone(&health));

    let request = TextRequest::new("test-model", "hello");
    let resp = gateway.text(request.clone()).await.unwrap();
    assert_eq!(resp.text, "from primary");
    // One transient failure, one retried success.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Second identical call: cache hit, no provider traffic.
    gateway.text(request).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Metrics saw the inner attempts; health saw the outcomes.
    assert_eq!(metrics.total().requests(), 2);
    assert_eq!(metrics.total().errors(), 1);
    assert!(health.is_healthy("primary"));
    assert!(health.snapshot("primary").is_some());
}

#[tokio::test]
async fn streams_survive_the_stack_and_book_metrics_at_the_end() {
    let metrics = Arc::new(MetricsRegistry::new());
    let health = Arc::new(HealthRegistry::new());
    let (mock, _calls) = Mock::new("primary");
    let gateway = full_stack(mock, Arc::clone(&metrics), Arc::clone(&health));

    let mut chunks = gateway
        .stream(TextRequest::new("test-model", "hello"))
        .await
        .unwrap();
    assert_eq!(metrics.total().requests(), 0);

    let mut text = String::new();
    while let Some(chunk) = chunks.next().await {
        text.push_str(&chunk.text);
    }
    assert_eq!(text, "chunk-ed");
    assert_eq!(metrics.total().requests(), 1);
    assert_eq!(metrics.kinds().snapshot(OpKind::Stream).requests, 1);
}

//! Counter atomicity under concurrency and error-kind bucketing.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use modelgate_core::{ErrorKind, OpKind};
use modelgate_metrics::{LabelSet, MetricsLayer, MetricsRegistry};
use tower::{Layer, ServiceExt};

use crate::support;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_count_exactly() {
    let registry = Arc::new(MetricsRegistry::new());
    let layer = MetricsLayer::new(Arc::clone(&registry)).provider("p");
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    let concurrency = 64;
    let mut handles = Vec::new();
    for _ in 0..concurrency {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.oneshot(support::request("hi")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(registry.total().requests(), concurrency);
    assert_eq!(registry.total().errors(), 0);
}

#[test]
fn error_kind_inference_is_idempotent() {
    for message in [
        "401 unauthorized key",
        "429 too many requests",
        "request timed out after 30s",
        "internal server error",
        "connection refused",
        "???",
    ] {
        let once = ErrorKind::infer(message);
        let twice = ErrorKind::infer(once.as_str());
        assert_eq!(once, twice, "inference drifted for {message:?}");
    }
}

#[tokio::test]
async fn failed_calls_bucket_under_their_error_kind() {
    let registry = Arc::new(MetricsRegistry::new());
    let layer = MetricsLayer::new(Arc::clone(&registry)).provider("p");
    let svc = layer.layer(support::counting_err(
        || modelgate_core::LlmError::rate_limit("slow down"),
        Arc::new(AtomicUsize::new(0)),
    ));

    let _ = svc.oneshot(support::request("hi")).await;

    let labels = LabelSet::new("p", "test-model", OpKind::Text).with_error("rate_limit");
    assert_eq!(registry.labeled(&labels).errors(), 1);
    assert_eq!(registry.total().errors(), 1);
}

//! Hit/miss behavior: miss-then-hit invokes downstream exactly once,
//! distinct requests miss independently, failures are never cached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_cache::CacheLayer;
use modelgate_core::{LlmError, LlmRequest, TextRequest};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test]
async fn miss_then_hit_invokes_downstream_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheLayer::builder()
        .capacity(10)
        .ttl(Duration::from_secs(3600))
        .build();
    let mut svc = layer.layer(support::counting_ok("answer", Arc::clone(&calls)));

    let request = LlmRequest::Text(TextRequest::new("m", "hi"));
    let first = svc.ready().await.unwrap().call(request.clone()).await.unwrap();
    let second = svc.ready().await.unwrap().call(request).await.unwrap();

    assert_eq!(support::text_of(first), "answer");
    assert_eq!(support::text_of(second), "answer");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn distinct_requests_miss_independently() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheLayer::builder().build();
    let mut svc = layer.layer(support::counting_ok("answer", Arc::clone(&calls)));

    svc.ready().await.unwrap().call(support::request("one")).await.unwrap();
    svc.ready().await.unwrap().call(support::request("two")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failures_are_never_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheLayer::builder().build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::provider_error("boom"),
        Arc::clone(&calls),
    ));

    for _ in 0..2 {
        let err = svc
            .ready()
            .await
            .unwrap()
            .call(support::request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "boom");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

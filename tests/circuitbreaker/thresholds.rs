//! Threshold behavior while closed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_circuitbreaker::{BreakerLayer, CircuitState};
use modelgate_core::{LlmError, LlmResponse};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test]
async fn opens_at_threshold_and_fails_fast() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = BreakerLayer::builder()
        .failure_threshold(3)
        .open_timeout(Duration::from_secs(30))
        .name("s2")
        .build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::provider_error("backend down"),
        Arc::clone(&calls),
    ));

    // Calls 1-3 fail with the downstream error.
    for _ in 0..3 {
        let err = svc
            .ready()
            .await
            .unwrap()
            .call(support::request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "backend down");
    }

    // Call 4 fails immediately with the circuit-open error.
    let err = svc
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    assert!(err.message().contains("circuit breaker"));
    assert!(!err.retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(layer.state(), CircuitState::Open);
}

#[tokio::test]
async fn successes_keep_the_circuit_closed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = BreakerLayer::builder().failure_threshold(2).build();
    let mut svc = layer.layer(support::counting_ok("fine", Arc::clone(&calls)));

    for _ in 0..10 {
        let resp = svc
            .ready()
            .await
            .unwrap()
            .call(support::request("hi"))
            .await
            .unwrap();
        assert!(matches!(resp, LlmResponse::Text(_)));
    }
    assert_eq!(layer.state(), CircuitState::Closed);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

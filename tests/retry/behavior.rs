//! Attempt counting: success after transient failures, the
//! `max_retries + 1` bound, and immediate propagation of non-retryable
//! failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_core::{handler_fn, LlmError};
use modelgate_retry::RetryLayer;
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn two_failures_then_success_invokes_three_times() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cc = Arc::clone(&calls);
    let flaky = handler_fn(move |_req| {
        let cc = Arc::clone(&cc);
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LlmError::network("transient"))
            } else {
                Ok(support::response("eventually"))
            }
        }
    });

    let layer = RetryLayer::builder()
        .max_retries(3)
        .exponential_backoff_with_factor(Duration::from_millis(1), 2.0)
        .jitter(false)
        .build();
    let mut svc = layer.layer(flaky);

    let resp = svc
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap();
    assert_eq!(support::text_of(resp), "eventually");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn persistent_failure_invokes_max_retries_plus_one() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RetryLayer::builder()
        .max_retries(4)
        .fixed_backoff(Duration::from_millis(1))
        .build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::timeout("deadline of 1s exceeded"),
        Arc::clone(&calls),
    ));

    let err = svc
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    // The last underlying failure comes back verbatim.
    assert!(err.is_timeout());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_failures_propagate_immediately() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RetryLayer::builder().max_retries(5).build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::validation("malformed request"),
        Arc::clone(&calls),
    ));

    let err = svc
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), modelgate_core::ErrorKind::Validation);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

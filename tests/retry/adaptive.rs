//! Outcome-driven delay adaptation through the engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_core::LlmError;
use modelgate_retry::{AdaptiveBackoff, RetryLayer};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn adaptive_backoff_widens_under_sustained_failure() {
    let backoff = AdaptiveBackoff::new(Duration::from_millis(10), 2.0)
        .failure_threshold(2)
        .success_threshold(2);

    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RetryLayer::builder()
        .max_retries(5)
        .adaptive_backoff(backoff)
        .max_delay(Duration::from_secs(1))
        .build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::network("down"),
        Arc::clone(&calls),
    ));

    let started = tokio::time::Instant::now();
    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    // Six attempts; the shared delay doubles every second failure, so the
    // total wait exceeds a flat 5 x 10ms schedule.
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert!(started.elapsed() > Duration::from_millis(50));
}

//! Waiter queue behavior: bounded slots, the reject policy, and release
//! on cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_ratelimiter::{QueuePolicy, RateLimiterLayer};
use tower::{Layer, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn full_queue_rejects_with_a_distinct_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RateLimiterLayer::builder().rate(1.0).capacity(1.0).build();
    let svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    // Drain the single burst token.
    svc.clone()
        .oneshot(support::request("hi"))
        .await
        .unwrap();

    // One waiter occupies the single queue slot.
    let waiter = tokio::spawn(svc.clone().oneshot(support::request("queued")));
    tokio::task::yield_now().await;

    // The next caller finds the queue full and fails immediately.
    let err = svc
        .clone()
        .oneshot(support::request("rejected"))
        .await
        .unwrap_err();
    assert!(err.is_rate_limit());
    assert!(err.message().contains("queue"));

    tokio::time::advance(Duration::from_secs(2)).await;
    waiter.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn reject_policy_never_queues() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RateLimiterLayer::builder()
        .rate(1.0)
        .capacity(1.0)
        .queue_policy(QueuePolicy::Reject)
        .build();
    let svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    svc.clone().oneshot(support::request("hi")).await.unwrap();
    let err = svc.clone().oneshot(support::request("hi")).await.unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_waiter_frees_its_queue_slot() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RateLimiterLayer::builder().rate(1.0).capacity(1.0).build();
    let svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    svc.clone().oneshot(support::request("hi")).await.unwrap();

    // A queued caller gives up.
    let abandoned = tokio::spawn(svc.clone().oneshot(support::request("abandoned")));
    tokio::task::yield_now().await;
    abandoned.abort();
    let join = abandoned.await;
    assert!(join.unwrap_err().is_cancelled());

    // Its slot is free again: a new caller queues and is admitted after
    // refill.
    let retry = tokio::spawn(svc.clone().oneshot(support::request("retry")));
    tokio::time::advance(Duration::from_secs(2)).await;
    retry.await.unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

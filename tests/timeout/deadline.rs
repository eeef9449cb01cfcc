//! Unary deadline enforcement: a slow downstream fails within the
//! deadline (plus epsilon) with a message naming the deadline.

use std::time::Duration;

use modelgate_core::handler_fn;
use modelgate_timeout::TimeoutLayer;
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn slow_downstream_times_out_near_the_deadline() {
    let slow = handler_fn(|_req| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(support::response("late"))
    });
    let layer = TimeoutLayer::builder()
        .timeout(Duration::from_millis(10))
        .build();
    let mut svc = layer.layer(slow);

    let started = tokio::time::Instant::now();
    let err = svc
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert!(err.message().contains("deadline"));
    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_millis(20));
}

//! Admission pacing: serial waits space at the refill period and the
//! total admitted stays under `rate * window + capacity`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_ratelimiter::RateLimiterLayer;
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn serial_overflow_waits_one_period_per_token() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = RateLimiterLayer::builder().rate(5.0).capacity(5.0).build();
    let mut svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    let started = tokio::time::Instant::now();
    let mut completions = Vec::new();
    for _ in 0..8 {
        svc.ready()
            .await
            .unwrap()
            .call(support::request("hi"))
            .await
            .unwrap();
        completions.push(started.elapsed());
    }

    // Five burst tokens pass immediately; the 6th..8th wait for refill at
    // 200ms per token.
    assert!(completions[4] < Duration::from_millis(50));
    assert!(completions[5] >= Duration::from_millis(200));
    assert!(completions[6] >= Duration::from_millis(400));
    assert!(completions[7] >= Duration::from_millis(600));
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}

#[tokio::test(start_paused = true)]
async fn throughput_is_bounded_by_rate_and_capacity() {
    let calls = Arc::new(AtomicUsize::new(0));
    let rate = 10.0;
    let capacity = 5.0;
    let layer = RateLimiterLayer::builder().rate(rate).capacity(capacity).build();
    let mut svc = layer.layer(support::counting_ok("ok", Arc::clone(&calls)));

    let window = Duration::from_secs(2);
    let started = tokio::time::Instant::now();
    while started.elapsed() < window {
        svc.ready()
            .await
            .unwrap()
            .call(support::request("hi"))
            .await
            .unwrap();
    }

    let bound = (rate * window.as_secs_f64() + capacity).ceil() as usize;
    assert!(
        calls.load(Ordering::SeqCst) <= bound,
        "admitted {} > bound {bound}",
        calls.load(Ordering::SeqCst)
    );
}

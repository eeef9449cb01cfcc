//! Half-open probing and recovery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_circuitbreaker::{BreakerLayer, CircuitState};
use modelgate_core::{handler_fn, LlmError};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test]
async fn half_open_probes_close_after_successes() {
    let healthy = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&healthy);
    let flaky = handler_fn(move |_req| {
        let flag = Arc::clone(&flag);
        async move {
            if flag.load(Ordering::SeqCst) == 0 {
                Err(LlmError::provider_error("down"))
            } else {
                Ok(support::response("recovered"))
            }
        }
    });

    let layer = BreakerLayer::builder()
        .failure_threshold(4)
        .success_threshold(2)
        .open_timeout(Duration::from_millis(20))
        .build();
    let mut svc = layer.layer(flaky);

    for _ in 0..4 {
        let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    }
    assert_eq!(layer.state(), CircuitState::Open);

    healthy.store(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Two successful probes close the circuit.
    svc.ready().await.unwrap().call(support::request("hi")).await.unwrap();
    assert_eq!(layer.state(), CircuitState::HalfOpen);
    svc.ready().await.unwrap().call(support::request("hi")).await.unwrap();
    assert_eq!(layer.state(), CircuitState::Closed);
}

#[tokio::test]
async fn probe_failure_reopens_the_circuit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = BreakerLayer::builder()
        .failure_threshold(1)
        .open_timeout(Duration::from_millis(20))
        .build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::provider_error("still down"),
        Arc::clone(&calls),
    ));

    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    assert_eq!(layer.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(30)).await;
    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    assert_eq!(layer.state(), CircuitState::Open);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn preserved_timer_lets_the_next_probe_in_sooner() {
    // With the reset knob off, a probe failure keeps the original opening
    // instant, so another probe is admitted immediately.
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = BreakerLayer::builder()
        .failure_threshold(1)
        .open_timeout(Duration::from_millis(20))
        .reset_timer_on_half_open_failure(false)
        .build();
    let mut svc = layer.layer(support::counting_err(
        || LlmError::provider_error("still down"),
        Arc::clone(&calls),
    ));

    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Probe fails, circuit re-opens, but the old stamp has already
    // expired: the next call probes again instead of failing fast.
    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    let _ = svc.ready().await.unwrap().call(support::request("hi")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

//! Health handling: unhealthy providers are never selected, an empty
//! healthy set is a Provider error, and a selected provider's failure
//! surfaces without failover.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modelgate_balancer::LoadBalancer;
use modelgate_core::{handler_fn, LlmError, LlmResponse};
use tower::{Service, ServiceExt};

use super::{named, served_by};
use crate::support;

#[tokio::test]
async fn unhealthy_providers_are_excluded_from_selection() {
    let mut balancer = LoadBalancer::builder()
        .provider("a", named("a"))
        .provider("b", named("b"))
        .provider("c", named("c"))
        .build();
    balancer.entry("b").unwrap().set_healthy(false);

    for _ in 0..6 {
        assert_ne!(served_by(&mut balancer).await, "b");
    }
}

#[tokio::test]
async fn all_unhealthy_yields_a_provider_error() {
    let mut balancer = LoadBalancer::builder().provider("a", named("a")).build();
    balancer.entry("a").unwrap().set_healthy(false);

    let err = balancer
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), modelgate_core::ErrorKind::Provider);
    assert!(err.message().contains("no healthy providers"));
    assert!(!err.retryable());
}

#[tokio::test]
async fn selected_failure_surfaces_without_failover() {
    let calls_b = Arc::new(AtomicUsize::new(0));
    let mut balancer = LoadBalancer::builder()
        .provider(
            "broken",
            handler_fn(|_req| async {
                Err::<LlmResponse, _>(LlmError::provider_error("exploded"))
            }),
        )
        .provider("fine", support::counting_ok("fine", Arc::clone(&calls_b)))
        .build();

    let err = balancer
        .ready()
        .await
        .unwrap()
        .call(support::request("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "exploded");
    // The healthy sibling was not consulted.
    assert_eq!(calls_b.load(Ordering::SeqCst), 0);
}

//! Balanced dispatch and the capability probe.

use std::sync::Arc;

use modelgate::Gateway;
use modelgate_balancer::Strategy;
use modelgate_core::{OpKind, TextRequest};
use modelgate_healthcheck::HealthRegistry;

use super::test_utils::Mock;

#[tokio::test]
async fn balanced_gateway_excludes_unhealthy_targets() {
    let health = Arc::new(HealthRegistry::new().unhealthy_threshold(1));
    let (a, _) = Mock::new("a");
    let (b, _) = Mock::new("b");
    let gateway = Gateway::builder()
        .provider(a)
        .provider(b)
        .balanced(Strategy::RoundRobin)
        .health_registry(Arc::clone(&health))
        .build();

    health.report_failure("a", "probe failed");
    for _ in 0..4 {
        let resp = gateway.text(TextRequest::new("m", "hi")).await.unwrap();
        assert_eq!(resp.text, "from b");
    }
}

#[tokio::test]
async fn capability_probe_spans_the_facade() {
    let (mock, _) = Mock::new("primary");
    let gateway = Gateway::builder().provider(mock).build();

    assert!(gateway.supports("primary", OpKind::Stream));
    assert!(!gateway.supports("primary", OpKind::Image));
    assert!(!gateway.supports("absent", OpKind::Text));

    let err = gateway
        .image(modelgate_core::ImageRequest {
            model: "m".into(),
            prompt: "a cat".into(),
            count: 1,
            size: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), modelgate_core::ErrorKind::Provider);
    assert!(err.message().contains("does not implement"));
}

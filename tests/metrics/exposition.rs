//! Exposition formats: namespaced counters with label suffixes,
//! cumulative histogram buckets, and the nested JSON form.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use modelgate_metrics::{MetricsLayer, MetricsRegistry};
use tower::{Layer, ServiceExt};

use crate::support;

#[tokio::test]
async fn exposition_covers_counters_histograms_and_kinds() {
    let registry = Arc::new(MetricsRegistry::new());
    let layer = MetricsLayer::new(Arc::clone(&registry)).provider("openai");
    let svc = layer.layer(support::counting_ok("ok", Arc::new(AtomicUsize::new(0))));

    svc.oneshot(support::request("hi")).await.unwrap();

    let text = registry.render_text();
    assert!(text.contains("modelgate_requests_total 1"));
    assert!(text.contains("provider=\"openai\""));
    assert!(text.contains("method=\"text\""));
    assert!(text.contains("le=\"+Inf\""));
    assert!(text.contains("modelgate_op_requests_total{method=\"text\"} 1"));

    let json = registry.render_json();
    assert_eq!(json["total"]["requests"], 1);
    assert_eq!(json["operations"][0]["method"], "text");
}

//! Stream bookkeeping: nothing books at handler return; requests, usage,
//! and kind counters book when the sequence terminates.

use std::sync::Arc;

use futures::StreamExt;
use modelgate_core::{LlmRequest, LlmResponse, OpKind, TextRequest};
use modelgate_metrics::{LabelSet, MetricsLayer, MetricsRegistry};
use tower::{Layer, ServiceExt};

use crate::support;

#[tokio::test]
async fn stream_usage_books_at_termination_with_stream_method_label() {
    let registry = Arc::new(MetricsRegistry::new());
    let layer = MetricsLayer::new(Arc::clone(&registry)).provider("p");
    let svc = layer.layer(support::streaming_ok());

    let req = LlmRequest::Stream(TextRequest::new("test-model", "hi"));
    let resp = svc.oneshot(req).await.unwrap();
    assert_eq!(registry.total().requests(), 0);

    let mut chunks = match resp {
        LlmResponse::Stream(s) => s,
        other => panic!("expected a stream, got {other:?}"),
    };
    while chunks.next().await.is_some() {}

    let snapshot = registry.total().snapshot();
    assert_eq!(snapshot.requests, 1);
    assert_eq!(snapshot.input_tokens, 1);
    assert_eq!(snapshot.output_tokens, 2);

    let labels = LabelSet::new("p", "test-model", OpKind::Stream);
    assert_eq!(registry.labeled(&labels).requests(), 1);
    assert_eq!(registry.kinds().snapshot(OpKind::Stream).requests, 1);
}

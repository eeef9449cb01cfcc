//! Stream-aware deadlines: expiry closes the wrapped sequence cleanly —
//! no error chunk, no deadlock — and fast streams pass untouched.

use std::time::Duration;

use futures::StreamExt;
use modelgate_core::{handler_fn, LlmRequest, LlmResponse, StreamChunk, TextRequest};
use modelgate_timeout::TimeoutLayer;
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test(start_paused = true)]
async fn stream_timeout_closes_without_error_or_deadlock() {
    let hanging_stream = handler_fn(|_req| async {
        let chunks = futures::stream::iter(vec![
            StreamChunk::text_delta("s", "m", "first"),
        ])
        .chain(futures::stream::pending());
        Ok(LlmResponse::Stream(Box::pin(chunks)))
    });
    let layer = TimeoutLayer::builder()
        .timeout(Duration::from_millis(100))
        .build();
    let mut svc = layer.layer(hanging_stream);

    let req = LlmRequest::Stream(TextRequest::new("m", "hi"));
    let resp = svc.ready().await.unwrap().call(req).await.unwrap();
    let mut chunks = match resp {
        LlmResponse::Stream(s) => s,
        other => panic!("expected a stream, got {other:?}"),
    };

    let first = chunks.next().await.unwrap();
    assert_eq!(first.text, "first");
    assert!(first.error.is_none());

    // The upstream never produces again; the deadline must end the
    // sequence cleanly rather than hang or inject an error chunk.
    let end = chunks.next().await;
    assert!(end.is_none());
}

#[tokio::test(start_paused = true)]
async fn fast_streams_are_untouched() {
    let layer = TimeoutLayer::builder()
        .timeout(Duration::from_secs(5))
        .build();
    let mut svc = layer.layer(support::streaming_ok());

    let req = LlmRequest::Stream(TextRequest::new("m", "hi"));
    let resp = svc.ready().await.unwrap().call(req).await.unwrap();
    let chunks: Vec<_> = match resp {
        LlmResponse::Stream(s) => s.collect().await,
        other => panic!("expected a stream, got {other:?}"),
    };
    assert_eq!(chunks.len(), 3);
    assert!(chunks.last().unwrap().finish_reason.is_some());
}

//! Retry engine invariants.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_core::{handler_fn, LlmError, LlmRequest, LlmResponse, TextRequest};
use modelgate_retry::RetryLayer;
use proptest::prelude::*;
use tokio::runtime::Runtime;
use tower::{Layer, Service, ServiceExt};

fn request() -> LlmRequest {
    LlmRequest::Text(TextRequest::new("m", "hi"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Downstream is invoked at most `max_retries + 1` times, exactly
    /// that many for a persistent retryable failure.
    #[test]
    fn attempts_are_bounded(max_retries in 0usize..6) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let cc = Arc::clone(&calls);
            let failing = handler_fn(move |_req| {
                let cc = Arc::clone(&cc);
                async move {
                    cc.fetch_add(1, Ordering::SeqCst);
                    Err::<LlmResponse, _>(LlmError::network("down"))
                }
            });

            let layer = RetryLayer::builder()
                .max_retries(max_retries)
                .fixed_backoff(Duration::from_micros(10))
                .build();
            let mut svc = layer.layer(failing);
            let _ = svc.ready().await.unwrap().call(request()).await;

            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        });
    }

    /// A success on attempt k stops the engine at exactly k invocations.
    #[test]
    fn first_success_stops_retrying(
        max_retries in 1usize..6,
        succeed_on in 1usize..4,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let cc = Arc::clone(&calls);
            let flaky = handler_fn(move |_req| {
                let cc = Arc::clone(&cc);
                async move {
                    if cc.fetch_add(1, Ordering::SeqCst) + 1 < succeed_on {
                        Err(LlmError::network("down"))
                    } else {
                        Ok(LlmResponse::Text(modelgate_core::TextResponse {
                            id: "r".into(),
                            model: "m".into(),
                            text: "ok".into(),
                            tool_calls: Vec::new(),
                            finish_reason: modelgate_core::FinishReason::Stop,
                            usage: modelgate_core::Usage::default(),
                            created: 0,
                        }))
                    }
                }
            });

            let layer = RetryLayer::builder()
                .max_retries(max_retries)
                .fixed_backoff(Duration::from_micros(10))
                .build();
            let mut svc = layer.layer(flaky);
            let result = svc.ready().await.unwrap().call(request()).await;

            let expected = succeed_on.min(max_retries + 1);
            assert_eq!(calls.load(Ordering::SeqCst), expected);
            if succeed_on <= max_retries + 1 {
                assert!(result.is_ok());
            } else {
                assert!(result.is_err());
            }
        });
    }
}

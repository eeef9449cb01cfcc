//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modelgate_core::{
    handler_fn, BoxLlmService, FinishReason, LlmError, LlmRequest, LlmResponse, StreamChunk,
    TextRequest, TextResponse, Usage,
};

/// A text request with a fixed model.
pub fn request(prompt: &str) -> LlmRequest {
    LlmRequest::Text(TextRequest::new("test-model", prompt))
}

/// A canned text response.
pub fn response(text: &str) -> LlmResponse {
    LlmResponse::Text(TextResponse {
        id: "resp".into(),
        model: "test-model".into(),
        text: text.into(),
        tool_calls: Vec::new(),
        finish_reason: FinishReason::Stop,
        usage: Usage::new(2, 3),
        created: 0,
    })
}

/// Extracts the text payload or panics.
pub fn text_of(response: LlmResponse) -> String {
    match response {
        LlmResponse::Text(r) => r.text,
        other => panic!("expected a text response, got {other:?}"),
    }
}

/// A handler that counts invocations and always answers `text`.
pub fn counting_ok(text: &'static str, calls: Arc<AtomicUsize>) -> BoxLlmService {
    handler_fn(move |_req| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(response(text))
        }
    })
}

/// A handler that counts invocations and always fails with the error.
pub fn counting_err(error: fn() -> LlmError, calls: Arc<AtomicUsize>) -> BoxLlmService {
    handler_fn(move |_req| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(error())
        }
    })
}

/// A handler producing a short chunk stream ending in a finish reason.
pub fn streaming_ok() -> BoxLlmService {
    handler_fn(|_req| async {
        let chunks = futures::stream::iter(vec![
            StreamChunk::text_delta("s", "test-model", "hel"),
            StreamChunk::text_delta("s", "test-model", "lo"),
            StreamChunk::finished(FinishReason::Stop, Some(Usage::new(1, 2))),
        ]);
        Ok(LlmResponse::Stream(Box::pin(chunks)))
    })
}

//! Shared mock provider and the standard full stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modelgate::{Gateway, Provider};
use modelgate_cache::CacheLayer;
use modelgate_circuitbreaker::BreakerLayer;
use modelgate_core::{
    ChunkStream, FinishReason, LlmError, OpKind, StreamChunk, TextRequest, TextResponse, Usage,
};
use modelgate_healthcheck::HealthRegistry;
use modelgate_metrics::MetricsRegistry;
use modelgate_ratelimiter::RateLimiterLayer;
use modelgate_retry::RetryLayer;
use modelgate_timeout::TimeoutLayer;

pub(crate) struct Mock {
    name: &'static str,
    calls: Arc<AtomicUsize>,
    fail_first: usize,
}

impl Mock {
    pub(crate) fn new(name: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                calls: Arc::clone(&calls),
                fail_first: 0,
            },
            calls,
        )
    }

    pub(crate) fn failing_first(mut self, failures: usize) -> Self {
        self.fail_first = failures;
        self
    }
}

#[async_trait]
impl Provider for Mock {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self, kind: OpKind) -> bool {
        matches!(kind, OpKind::Text | OpKind::Stream)
    }

    async fn text(&self, request: TextRequest) -> Result<TextResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(LlmError::network("transient glitch"));
        }
        Ok(TextResponse {
            id: format!("{}-{call}", self.name),
            model: request.model,
            text: format!("from {}", self.name),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Usage::new(10, 20),
            created: 0,
        })
    }

    async fn stream(&self, _request: TextRequest) -> Result<ChunkStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks = futures::stream::iter(vec![
            StreamChunk::text_delta("s", "m", "chunk-"),
            StreamChunk::text_delta("s", "m", "ed"),
            StreamChunk::finished(FinishReason::Stop, Some(Usage::new(4, 6))),
        ]);
        Ok(Box::pin(chunks))
    }
}

pub(crate) fn full_stack(
    provider: Mock,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthRegistry>,
) -> Gateway {
    Gateway::builder()
        .provider(provider)
        .layer(TimeoutLayer::builder().timeout(Duration::from_secs(5)).build())
        .layer(
            RetryLayer::builder()
                .max_retries(2)
                .fixed_backoff(Duration::from_millis(1))
                .build(),
        )
        .layer(RateLimiterLayer::builder().rate(1000.0).build())
        .layer(BreakerLayer::builder().failure_threshold(10).build())
        .layer(CacheLayer::builder().ttl(Duration::from_secs(60)).build())
        .metrics(metrics)
        .health_registry(health)
        .build()
}

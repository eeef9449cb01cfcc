//! The metrics middleware.
//!
//! Bookkeeping happens at the terminal outcome of each call. For unary
//! kinds that is the handler's return; for Stream it is the termination of
//! the chunk sequence — producer close, error chunk, or the consumer
//! dropping the stream — never the handler's return.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use futures::Stream;
use modelgate_core::{ChunkStream, LlmError, LlmRequest, LlmResponse, OpKind, StreamChunk, Usage};
use pin_project_lite::pin_project;
use tower::{Layer, Service, ServiceExt};

use crate::registry::{error_kind_label, LabelSet, MetricsRegistry};

/// A middleware layer that records call metrics into a shared
/// [`MetricsRegistry`].
///
/// The provider label is fixed at construction (the facade knows which
/// dispatch target a chain wraps); model and method labels come from each
/// request.
///
/// # Examples
///
/// ```
/// use modelgate_metrics::{MetricsLayer, MetricsRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(MetricsRegistry::new());
/// let layer = MetricsLayer::new(Arc::clone(&registry)).provider("anthropic");
/// ```
#[derive(Clone)]
pub struct MetricsLayer {
    registry: Arc<MetricsRegistry>,
    provider: String,
}

impl MetricsLayer {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self {
            registry,
            provider: String::from("default"),
        }
    }

    /// Sets the provider label stamped on every bucket.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

impl<S> Layer<S> for MetricsLayer {
    type Service = Metrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Metrics {
            inner,
            registry: Arc::clone(&self.registry),
            provider: self.provider.clone(),
        }
    }
}

/// The metrics middleware service. Built by [`MetricsLayer`].
#[derive(Clone)]
pub struct Metrics<S> {
    inner: S,
    registry: Arc<MetricsRegistry>,
    provider: String,
}

impl<S> Service<LlmRequest> for Metrics<S>
where
    S: Service<LlmRequest, Response = LlmResponse, Error = LlmError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = LlmResponse;
    type Error = LlmError;
    type Future = BoxFuture<'static, Result<LlmResponse, LlmError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: LlmRequest) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        let labels = LabelSet::new(self.provider.clone(), req.model(), req.kind());
        let kind = req.kind();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let started = Instant::now();
            let result = inner.ready().await?.call(req).await;

            match result {
                Ok(LlmResponse::Stream(chunks)) => {
                    // Defer bookkeeping to stream termination.
                    let recorder = StreamRecorder {
                        registry,
                        labels,
                        kind,
                        started,
                        usage: None,
                        error_label: None,
                        done: false,
                    };
                    let metered: ChunkStream = Box::pin(MeteredStream {
                        inner: chunks,
                        recorder,
                    });
                    Ok(LlmResponse::Stream(metered))
                }
                Ok(response) => {
                    let latency = started.elapsed();
                    registry.total().record_call(latency, false);
                    registry.kinds().record(kind, latency, false);
                    let bucket = registry.labeled(&labels);
                    bucket.record_call(latency, false);
                    if let Some(usage) = response.usage() {
                        registry.total().record_usage(&usage);
                        bucket.record_usage(&usage);
                    }
                    Ok(response)
                }
                Err(error) => {
                    let latency = started.elapsed();
                    registry.total().record_call(latency, true);
                    registry.kinds().record(kind, latency, true);
                    registry
                        .labeled(&labels.with_error(error_kind_label(&error)))
                        .record_call(latency, true);
                    Err(error)
                }
            }
        })
    }
}

/// Records a stream's outcome exactly once: at the terminal chunk, at
/// producer close, or — via `Drop` — when the consumer abandons the
/// sequence early.
struct StreamRecorder {
    registry: Arc<MetricsRegistry>,
    labels: LabelSet,
    kind: OpKind,
    started: Instant,
    usage: Option<Usage>,
    error_label: Option<&'static str>,
    done: bool,
}

impl StreamRecorder {
    fn observe(&mut self, chunk: &StreamChunk) {
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
        }
        if let Some(error) = &chunk.error {
            self.error_label = Some(error_kind_label(error));
            self.finish();
        } else if chunk.finish_reason.is_some() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        let latency = self.started.elapsed();
        let failed = self.error_label.is_some();
        self.registry.total().record_call(latency, failed);
        self.registry.kinds().record(self.kind, latency, failed);
        let labels = match self.error_label {
            Some(kind) => self.labels.with_error(kind),
            None => self.labels.clone(),
        };
        let bucket = self.registry.labeled(&labels);
        bucket.record_call(latency, failed);
        if let Some(usage) = &self.usage {
            self.registry.total().record_usage(usage);
            bucket.record_usage(usage);
        }
    }
}

impl Drop for StreamRecorder {
    fn drop(&mut self) {
        self.finish();
    }
}

pin_project! {
    struct MeteredStream {
        #[pin]
        inner: ChunkStream,
        recorder: StreamRecorder,
    }
}

impl Stream for MeteredStream {
    type Item = StreamChunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamChunk>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(chunk)) => {
                this.recorder.observe(&chunk);
                Poll::Ready(Some(chunk))
            }
            Poll::Ready(None) => {
                this.recorder.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

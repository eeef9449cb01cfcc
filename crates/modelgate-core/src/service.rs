//! Handler aliases and the middleware chain.
//!
//! A handler is a [`tower::Service`] from [`LlmRequest`] to [`LlmResponse`]
//! with [`LlmError`] failures. Middleware is anything implementing
//! [`tower::Layer`] over such a service. [`Chain`] holds an ordered list of
//! boxed layers and applies them so that the first layer added is the
//! outermost: it sees the request first and the response last.

use std::future::Future;

use tower::util::{BoxCloneSyncService, BoxCloneSyncServiceLayer};
use tower::{Layer, Service};

use crate::error::LlmError;
use crate::op::{LlmRequest, LlmResponse};
use crate::types::{
    AudioRequest, AudioResponse, ChunkStream, EmbeddingsRequest, EmbeddingsResponse, ImageRequest,
    ImageResponse, StructuredRequest, StructuredResponse, TextRequest, TextResponse,
};

/// A boxed, cloneable untyped handler.
pub type BoxLlmService = BoxCloneSyncService<LlmRequest, LlmResponse, LlmError>;

/// A boxed middleware over [`BoxLlmService`].
pub type BoxLlmLayer = BoxCloneSyncServiceLayer<BoxLlmService, LlmRequest, LlmResponse, LlmError>;

/// Typed handler for the Text operation.
pub type TextHandler = BoxCloneSyncService<TextRequest, TextResponse, LlmError>;
/// Typed handler for the Stream operation. The response is the lazy chunk
/// sequence; its termination is the terminal event through the chain.
pub type StreamHandler = BoxCloneSyncService<TextRequest, ChunkStream, LlmError>;
/// Typed handler for the Structured operation.
pub type StructuredHandler = BoxCloneSyncService<StructuredRequest, StructuredResponse, LlmError>;
/// Typed handler for the Embeddings operation.
pub type EmbeddingsHandler = BoxCloneSyncService<EmbeddingsRequest, EmbeddingsResponse, LlmError>;
/// Typed handler for the Audio operation.
pub type AudioHandler = BoxCloneSyncService<AudioRequest, AudioResponse, LlmError>;
/// Typed handler for the Image operation.
pub type ImageHandler = BoxCloneSyncService<ImageRequest, ImageResponse, LlmError>;

/// Builds an untyped handler from an async function.
pub fn handler_fn<F, Fut>(f: F) -> BoxLlmService
where
    F: FnMut(LlmRequest) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<LlmResponse, LlmError>> + Send + 'static,
{
    BoxCloneSyncService::new(tower::service_fn(f))
}

/// An ordered, immutable-once-applied sequence of middleware.
///
/// Layers run outside-in on entry and inside-out on return: for layers
/// `[m1, m2, m3]` around base `b`, a request traverses `m1 → m2 → m3 → b`
/// and the response returns `b → m3 → m2 → m1`. Any layer may short-circuit
/// by resolving without calling its inner service.
#[derive(Default)]
pub struct Chain {
    layers: Vec<BoxLlmLayer>,
}

impl Chain {
    /// Creates an empty chain; applying it returns the base unchanged.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends a middleware. Later additions sit closer to the base.
    pub fn with<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxLlmService> + Send + Sync + 'static,
        L::Service: Service<LlmRequest, Response = LlmResponse, Error = LlmError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<LlmRequest>>::Future: Send + 'static,
    {
        self.layers.push(BoxCloneSyncServiceLayer::new(layer));
        self
    }

    /// Appends an already boxed middleware.
    pub fn with_boxed(mut self, layer: BoxLlmLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Wraps the base handler in every layer, first-added outermost.
    pub fn apply(&self, base: BoxLlmService) -> BoxLlmService {
        self.layers
            .iter()
            .rev()
            .fold(base, |inner, layer| layer.layer(inner))
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("layers", &self.layers.len()).finish()
    }
}

//! The backend contract.

use std::sync::Arc;

use async_trait::async_trait;
use modelgate_core::{
    handler_fn, AudioRequest, AudioResponse, BoxLlmService, ChunkStream, EmbeddingsRequest,
    EmbeddingsResponse, ImageRequest, ImageResponse, LlmError, LlmRequest, LlmResponse, OpKind,
    StructuredRequest, StructuredResponse, TextRequest, TextResponse,
};

/// The failure returned for an operation a backend does not implement.
pub fn unsupported(provider: &str, kind: OpKind) -> LlmError {
    LlmError::provider_error(format!("provider '{provider}' does not implement {kind}"))
        .with_provider(provider)
}

/// A backend offering some subset of the six operations.
///
/// Implementations override [`supports`](Provider::supports) and the
/// operations they actually speak; every unimplemented operation falls
/// back to a "not implemented" Provider failure. Wire formats, transport
/// and credentials are entirely the implementation's concern — the
/// pipeline only sees the vendor-neutral request and response shapes.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use modelgate::Provider;
/// use modelgate_core::*;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Provider for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn supports(&self, kind: OpKind) -> bool {
///         kind == OpKind::Text
///     }
///
///     async fn text(&self, request: TextRequest) -> Result<TextResponse, LlmError> {
///         Ok(TextResponse {
///             id: "echo-1".into(),
///             model: request.model,
///             text: request.messages.last().map(|m| m.content.clone()).unwrap_or_default(),
///             tool_calls: Vec::new(),
///             finish_reason: FinishReason::Stop,
///             usage: Usage::default(),
///             created: 0,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique name this backend is registered under.
    fn name(&self) -> &str;

    /// Capability probe: whether the backend implements the operation.
    fn supports(&self, kind: OpKind) -> bool;

    async fn text(&self, request: TextRequest) -> Result<TextResponse, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Text))
    }

    async fn stream(&self, request: TextRequest) -> Result<ChunkStream, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Stream))
    }

    async fn structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredResponse, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Structured))
    }

    async fn embeddings(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Embeddings))
    }

    async fn audio(&self, request: AudioRequest) -> Result<AudioResponse, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Audio))
    }

    async fn image(&self, request: ImageRequest) -> Result<ImageResponse, LlmError> {
        let _ = request;
        Err(unsupported(self.name(), OpKind::Image))
    }
}

/// Adapts a backend into the untyped handler the chain composes over.
/// Unsupported kinds fail before reaching the backend.
pub(crate) fn provider_service(provider: Arc<dyn Provider>) -> BoxLlmService {
    handler_fn(move |request: LlmRequest| {
        let provider = Arc::clone(&provider);
        async move {
            let kind = request.kind();
            if !provider.supports(kind) {
                return Err(unsupported(provider.name(), kind));
            }
            match request {
                LlmRequest::Text(r) => provider.text(r).await.map(LlmResponse::Text),
                LlmRequest::Stream(r) => provider.stream(r).await.map(LlmResponse::Stream),
                LlmRequest::Structured(r) => {
                    provider.structured(r).await.map(LlmResponse::Structured)
                }
                LlmRequest::Embeddings(r) => {
                    provider.embeddings(r).await.map(LlmResponse::Embeddings)
                }
                LlmRequest::Audio(r) => provider.audio(r).await.map(LlmResponse::Audio),
                LlmRequest::Image(r) => provider.image(r).await.map(LlmResponse::Image),
            }
        }
    })
}

//! The dispatch facade.

use std::collections::HashMap;
use std::sync::Arc;

use modelgate_core::{
    AudioHandler, AudioRequest, AudioResponse, BoxLlmService, ChunkStream, EmbeddingsHandler,
    EmbeddingsRequest, EmbeddingsResponse, ImageHandler, ImageRequest, ImageResponse, LlmError,
    LlmRequest, LlmResponse, OpKind, StreamHandler, StructuredHandler, StructuredRequest,
    StructuredResponse, TextHandler, TextRequest, TextResponse,
};
use tower::ServiceExt;

use crate::dispatch;
use crate::provider::Provider;

/// The facade callers dispatch operations through.
///
/// Each registered backend is wrapped once, at construction, in the
/// composed middleware chain; a call clones the cheap service handle and
/// drives it. Unnamed calls go to the balancer when one is configured,
/// otherwise to the default provider.
///
/// Dropping a returned future cancels the call at its current suspension
/// point; dropping a returned [`ChunkStream`] abandons the stream.
pub struct Gateway {
    targets: HashMap<String, BoxLlmService>,
    providers: HashMap<String, Arc<dyn Provider>>,
    default_target: Option<String>,
    balanced: Option<BoxLlmService>,
}

impl Gateway {
    /// Starts a builder.
    pub fn builder() -> crate::GatewayBuilder {
        crate::GatewayBuilder::new()
    }

    pub(crate) fn new(
        targets: HashMap<String, BoxLlmService>,
        providers: HashMap<String, Arc<dyn Provider>>,
        default_target: Option<String>,
        balanced: Option<BoxLlmService>,
    ) -> Self {
        Self {
            targets,
            providers,
            default_target,
            balanced,
        }
    }

    /// Names of every registered provider.
    pub fn providers(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    /// Capability probe: whether the named provider implements the kind.
    pub fn supports(&self, provider: &str, kind: OpKind) -> bool {
        self.providers
            .get(provider)
            .map(|p| p.supports(kind))
            .unwrap_or(false)
    }

    fn target(&self, provider: Option<&str>) -> Result<BoxLlmService, LlmError> {
        match provider {
            Some(name) => self
                .targets
                .get(name)
                .cloned()
                .ok_or_else(|| LlmError::validation(format!("unknown provider '{name}'"))),
            None => {
                if let Some(balanced) = &self.balanced {
                    return Ok(balanced.clone());
                }
                self.default_target
                    .as_deref()
                    .and_then(|name| self.targets.get(name).cloned())
                    .ok_or_else(|| LlmError::validation("no providers registered"))
            }
        }
    }

    /// Untyped dispatch through the default target or balancer.
    pub async fn execute(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.target(None)?.oneshot(request).await
    }

    /// Untyped dispatch through a named provider.
    pub async fn execute_with(
        &self,
        provider: &str,
        request: LlmRequest,
    ) -> Result<LlmResponse, LlmError> {
        self.target(Some(provider))?.oneshot(request).await
    }

    /// Generates text.
    pub async fn text(&self, request: TextRequest) -> Result<TextResponse, LlmError> {
        self.execute(LlmRequest::Text(request)).await?.into_text()
    }

    /// Generates text through a named provider.
    pub async fn text_with(
        &self,
        provider: &str,
        request: TextRequest,
    ) -> Result<TextResponse, LlmError> {
        self.execute_with(provider, LlmRequest::Text(request))
            .await?
            .into_text()
    }

    /// Opens a streaming generation. The chain runs to produce the
    /// sequence; policies with end-of-stream bookkeeping have attached it
    /// to the returned stream's termination.
    pub async fn stream(&self, request: TextRequest) -> Result<ChunkStream, LlmError> {
        self.execute(LlmRequest::Stream(request)).await?.into_stream()
    }

    /// Opens a streaming generation through a named provider.
    pub async fn stream_with(
        &self,
        provider: &str,
        request: TextRequest,
    ) -> Result<ChunkStream, LlmError> {
        self.execute_with(provider, LlmRequest::Stream(request))
            .await?
            .into_stream()
    }

    /// Requests schema-constrained output.
    pub async fn structured(
        &self,
        request: StructuredRequest,
    ) -> Result<StructuredResponse, LlmError> {
        self.execute(LlmRequest::Structured(request))
            .await?
            .into_structured()
    }

    /// Requests schema-constrained output through a named provider.
    pub async fn structured_with(
        &self,
        provider: &str,
        request: StructuredRequest,
    ) -> Result<StructuredResponse, LlmError> {
        self.execute_with(provider, LlmRequest::Structured(request))
            .await?
            .into_structured()
    }

    /// Embeds inputs.
    pub async fn embeddings(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, LlmError> {
        self.execute(LlmRequest::Embeddings(request))
            .await?
            .into_embeddings()
    }

    /// Embeds inputs through a named provider.
    pub async fn embeddings_with(
        &self,
        provider: &str,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, LlmError> {
        self.execute_with(provider, LlmRequest::Embeddings(request))
            .await?
            .into_embeddings()
    }

    /// Runs an audio operation.
    pub async fn audio(&self, request: AudioRequest) -> Result<AudioResponse, LlmError> {
        self.execute(LlmRequest::Audio(request)).await?.into_audio()
    }

    /// Runs an audio operation through a named provider.
    pub async fn audio_with(
        &self,
        provider: &str,
        request: AudioRequest,
    ) -> Result<AudioResponse, LlmError> {
        self.execute_with(provider, LlmRequest::Audio(request))
            .await?
            .into_audio()
    }

    /// Generates images.
    pub async fn image(&self, request: ImageRequest) -> Result<ImageResponse, LlmError> {
        self.execute(LlmRequest::Image(request)).await?.into_image()
    }

    /// Generates images through a named provider.
    pub async fn image_with(
        &self,
        provider: &str,
        request: ImageRequest,
    ) -> Result<ImageResponse, LlmError> {
        self.execute_with(provider, LlmRequest::Image(request))
            .await?
            .into_image()
    }

    /// The Text-typed handler for a provider (or the default target),
    /// with the full chain applied.
    pub fn text_handler(&self, provider: Option<&str>) -> Result<TextHandler, LlmError> {
        Ok(dispatch::text_handler(self.target(provider)?))
    }

    /// The Stream-typed handler for a provider (or the default target).
    pub fn stream_handler(&self, provider: Option<&str>) -> Result<StreamHandler, LlmError> {
        Ok(dispatch::stream_handler(self.target(provider)?))
    }

    /// The Structured-typed handler for a provider (or the default
    /// target).
    pub fn structured_handler(
        &self,
        provider: Option<&str>,
    ) -> Result<StructuredHandler, LlmError> {
        Ok(dispatch::structured_handler(self.target(provider)?))
    }

    /// The Embeddings-typed handler for a provider (or the default
    /// target).
    pub fn embeddings_handler(
        &self,
        provider: Option<&str>,
    ) -> Result<EmbeddingsHandler, LlmError> {
        Ok(dispatch::embeddings_handler(self.target(provider)?))
    }

    /// The Audio-typed handler for a provider (or the default target).
    pub fn audio_handler(&self, provider: Option<&str>) -> Result<AudioHandler, LlmError> {
        Ok(dispatch::audio_handler(self.target(provider)?))
    }

    /// The Image-typed handler for a provider (or the default target).
    pub fn image_handler(&self, provider: Option<&str>) -> Result<ImageHandler, LlmError> {
        Ok(dispatch::image_handler(self.target(provider)?))
    }
}

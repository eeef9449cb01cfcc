//! The typed dispatch layer.
//!
//! Policy middleware composes over the untyped [`LlmRequest`] /
//! [`LlmResponse`] envelopes. This module projects an applied chain back
//! onto the six typed handler shapes by wrapping the request into its
//! envelope variant on the way in and unwrapping the response on the way
//! out — so operational policies surround typed calls without discarding
//! type information. A response that comes back as the wrong variant is a
//! backend bug and surfaces as an `Invalid` error.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::TryFutureExt;
use modelgate_core::{
    AudioHandler, BoxLlmService, EmbeddingsHandler, ImageHandler, LlmError, LlmRequest,
    LlmResponse, StreamHandler, StructuredHandler, TextHandler,
};
use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceExt};

/// An untyped handler projected to one operation kind.
pub struct Lifted<Req, Resp> {
    inner: BoxLlmService,
    wrap: fn(Req) -> LlmRequest,
    unwrap: fn(LlmResponse) -> Result<Resp, LlmError>,
}

impl<Req, Resp> Clone for Lifted<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            wrap: self.wrap,
            unwrap: self.unwrap,
        }
    }
}

impl<Req, Resp> Service<Req> for Lifted<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    type Response = Resp;
    type Error = LlmError;
    type Future = BoxFuture<'static, Result<Resp, LlmError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Req) -> Self::Future {
        let unwrap = self.unwrap;
        let envelope = (self.wrap)(request);
        let mut inner = self.inner.clone();
        Box::pin(
            async move { inner.ready().await?.call(envelope).await }
                .and_then(move |response| async move { unwrap(response) }),
        )
    }
}

fn lift<Req, Resp>(
    service: BoxLlmService,
    wrap: fn(Req) -> LlmRequest,
    unwrap: fn(LlmResponse) -> Result<Resp, LlmError>,
) -> BoxCloneSyncService<Req, Resp, LlmError>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    BoxCloneSyncService::new(Lifted {
        inner: service,
        wrap,
        unwrap,
    })
}

/// Projects an untyped handler to the Text kind.
pub fn text_handler(service: BoxLlmService) -> TextHandler {
    lift(service, LlmRequest::Text, LlmResponse::into_text)
}

/// Projects an untyped handler to the Stream kind. The handler's response
/// is the lazy chunk sequence; middleware teardown rides its termination.
pub fn stream_handler(service: BoxLlmService) -> StreamHandler {
    lift(service, LlmRequest::Stream, LlmResponse::into_stream)
}

/// Projects an untyped handler to the Structured kind.
pub fn structured_handler(service: BoxLlmService) -> StructuredHandler {
    lift(service, LlmRequest::Structured, LlmResponse::into_structured)
}

/// Projects an untyped handler to the Embeddings kind.
pub fn embeddings_handler(service: BoxLlmService) -> EmbeddingsHandler {
    lift(service, LlmRequest::Embeddings, LlmResponse::into_embeddings)
}

/// Projects an untyped handler to the Audio kind.
pub fn audio_handler(service: BoxLlmService) -> AudioHandler {
    lift(service, LlmRequest::Audio, LlmResponse::into_audio)
}

/// Projects an untyped handler to the Image kind.
pub fn image_handler(service: BoxLlmService) -> ImageHandler {
    lift(service, LlmRequest::Image, LlmResponse::into_image)
}

//! The closed set of operation kinds and the untyped request/response
//! envelopes the chain is composed over.

use std::fmt;

use serde::Serialize;

use crate::error::{ErrorKind, LlmError};
use crate::types::{
    AudioRequest, AudioResponse, ChunkStream, EmbeddingsRequest, EmbeddingsResponse, ImageRequest,
    ImageResponse, StructuredRequest, StructuredResponse, TextRequest, TextResponse, Usage,
};

/// The six operation kinds a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Text,
    Stream,
    Structured,
    Embeddings,
    Audio,
    Image,
}

impl OpKind {
    /// All kinds, in declaration order.
    pub const ALL: [OpKind; 6] = [
        OpKind::Text,
        OpKind::Stream,
        OpKind::Structured,
        OpKind::Embeddings,
        OpKind::Audio,
        OpKind::Image,
    ];

    /// Stable lowercase identifier, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Text => "text",
            OpKind::Stream => "stream",
            OpKind::Structured => "structured",
            OpKind::Embeddings => "embeddings",
            OpKind::Audio => "audio",
            OpKind::Image => "image",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped request envelope: one variant per operation kind.
///
/// Policy middleware operates on this envelope without inspecting payloads;
/// the dispatch layer wraps and unwraps it at the typed boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LlmRequest {
    Text(TextRequest),
    Stream(TextRequest),
    Structured(StructuredRequest),
    Embeddings(EmbeddingsRequest),
    Audio(AudioRequest),
    Image(ImageRequest),
}

impl LlmRequest {
    pub fn kind(&self) -> OpKind {
        match self {
            LlmRequest::Text(_) => OpKind::Text,
            LlmRequest::Stream(_) => OpKind::Stream,
            LlmRequest::Structured(_) => OpKind::Structured,
            LlmRequest::Embeddings(_) => OpKind::Embeddings,
            LlmRequest::Audio(_) => OpKind::Audio,
            LlmRequest::Image(_) => OpKind::Image,
        }
    }

    /// The model named by the request.
    pub fn model(&self) -> &str {
        match self {
            LlmRequest::Text(r) | LlmRequest::Stream(r) => &r.model,
            LlmRequest::Structured(r) => &r.model,
            LlmRequest::Embeddings(r) => &r.model,
            LlmRequest::Audio(r) => &r.model,
            LlmRequest::Image(r) => &r.model,
        }
    }
}

/// Untyped response envelope: one variant per operation kind.
///
/// `Stream` holds the lazy chunk sequence and is the only variant that
/// cannot be cloned; everything that memoizes responses must go through
/// [`LlmResponse::try_clone`].
pub enum LlmResponse {
    Text(TextResponse),
    Stream(ChunkStream),
    Structured(StructuredResponse),
    Embeddings(EmbeddingsResponse),
    Audio(AudioResponse),
    Image(ImageResponse),
}

impl fmt::Debug for LlmResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmResponse::Text(r) => f.debug_tuple("Text").field(r).finish(),
            LlmResponse::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
            LlmResponse::Structured(r) => f.debug_tuple("Structured").field(r).finish(),
            LlmResponse::Embeddings(r) => f.debug_tuple("Embeddings").field(r).finish(),
            LlmResponse::Audio(r) => f.debug_tuple("Audio").field(r).finish(),
            LlmResponse::Image(r) => f.debug_tuple("Image").field(r).finish(),
        }
    }
}

impl LlmResponse {
    pub fn kind(&self) -> OpKind {
        match self {
            LlmResponse::Text(_) => OpKind::Text,
            LlmResponse::Stream(_) => OpKind::Stream,
            LlmResponse::Structured(_) => OpKind::Structured,
            LlmResponse::Embeddings(_) => OpKind::Embeddings,
            LlmResponse::Audio(_) => OpKind::Audio,
            LlmResponse::Image(_) => OpKind::Image,
        }
    }

    /// Clones every variant except `Stream`, which is consume-once.
    pub fn try_clone(&self) -> Option<LlmResponse> {
        match self {
            LlmResponse::Text(r) => Some(LlmResponse::Text(r.clone())),
            LlmResponse::Stream(_) => None,
            LlmResponse::Structured(r) => Some(LlmResponse::Structured(r.clone())),
            LlmResponse::Embeddings(r) => Some(LlmResponse::Embeddings(r.clone())),
            LlmResponse::Audio(r) => Some(LlmResponse::Audio(r.clone())),
            LlmResponse::Image(r) => Some(LlmResponse::Image(r.clone())),
        }
    }

    /// Token usage reported by the response, where the kind carries one.
    pub fn usage(&self) -> Option<Usage> {
        match self {
            LlmResponse::Text(r) => Some(r.usage),
            LlmResponse::Structured(r) => Some(r.usage),
            LlmResponse::Embeddings(r) => r.usage,
            LlmResponse::Stream(_) | LlmResponse::Audio(_) | LlmResponse::Image(_) => None,
        }
    }
}

/// Error for a response envelope that did not match the dispatched kind.
/// This indicates a backend bug, not a caller mistake.
pub(crate) fn kind_mismatch(expected: OpKind, got: OpKind) -> LlmError {
    LlmError::new(
        ErrorKind::Invalid,
        format!("dispatch produced a {got} response for a {expected} operation"),
    )
}

macro_rules! unwrap_response {
    ($fn_name:ident, $variant:ident, $kind:expr, $resp:ty) => {
        impl LlmResponse {
            #[doc = concat!("Extracts the `", stringify!($variant), "` payload, or a kind-mismatch error.")]
            pub fn $fn_name(self) -> Result<$resp, LlmError> {
                match self {
                    LlmResponse::$variant(r) => Ok(r),
                    other => Err(kind_mismatch($kind, other.kind())),
                }
            }
        }
    };
}

unwrap_response!(into_text, Text, OpKind::Text, TextResponse);
unwrap_response!(into_stream, Stream, OpKind::Stream, ChunkStream);
unwrap_response!(into_structured, Structured, OpKind::Structured, StructuredResponse);
unwrap_response!(into_embeddings, Embeddings, OpKind::Embeddings, EmbeddingsResponse);
unwrap_response!(into_audio, Audio, OpKind::Audio, AudioResponse);
unwrap_response!(into_image, Image, OpKind::Image, ImageResponse);

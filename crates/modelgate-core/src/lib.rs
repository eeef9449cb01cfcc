//! Core infrastructure for modelgate.
//!
//! This crate defines everything the middleware crates and the gateway
//! facade share:
//!
//! - the operation model: six kinds ([`OpKind`]) with vendor-neutral
//!   request/response shapes and the untyped [`LlmRequest`]/[`LlmResponse`]
//!   envelopes the policy chain is composed over;
//! - the handler contract: [`BoxLlmService`] (a boxed
//!   [`tower::Service`]) plus [`Chain`], an ordered middleware composition
//!   where the first layer added is the outermost;
//! - the structured error model: [`LlmError`] with the closed
//!   [`ErrorKind`] taxonomy and single-wrap [`MiddlewareError`];
//! - the event-listener infrastructure used by every middleware crate.
//!
//! Cancellation is drop-based: dropping a call future cancels every
//! suspension point below it (rate-limit waits, retry backoff sleeps,
//! timeout races, stream consumption).

pub mod error;
pub mod events;
pub mod op;
pub mod service;
pub mod types;

pub use error::{ErrorKind, LlmError, MiddlewareError};
pub use events::{EventListener, EventListeners, FnListener, GatewayEvent};
pub use op::{LlmRequest, LlmResponse, OpKind};
pub use service::{
    handler_fn, AudioHandler, BoxLlmLayer, BoxLlmService, Chain, EmbeddingsHandler, ImageHandler,
    StreamHandler, StructuredHandler, TextHandler,
};
pub use types::{
    AudioInput, AudioRequest, AudioResponse, ChatMessage, ChunkStream, Embedding,
    EmbeddingsRequest, EmbeddingsResponse, FinishReason, ImageData, ImageRequest, ImageResponse,
    Role, StreamChunk, StructuredRequest, StructuredResponse, TextRequest, TextResponse, ToolCall,
    ToolSpec, Usage,
};

//! Provider-agnostic LLM client core.
//!
//! modelgate exposes one request/response surface for six operation kinds
//! — text, streaming, structured output, embeddings, audio, and image —
//! and routes each call through a composable pipeline of operational
//! policies before it reaches a backend:
//!
//! - [`modelgate_cache`]: response memoization (memory, TTL, LRU)
//! - [`modelgate_circuitbreaker`]: three-state failure gating
//! - [`modelgate_ratelimiter`]: token-bucket admission, latency- and
//!   health-adaptive rates
//! - [`modelgate_retry`]: bounded attempts, backoff families, jitter
//! - [`modelgate_timeout`]: deadline enforcement, stream-aware
//! - [`modelgate_balancer`]: multi-provider dispatch strategies
//! - [`modelgate_healthcheck`]: liveness sampling and in-band gating
//! - [`modelgate_metrics`]: counters, histograms, exposition
//!
//! # Composing a gateway
//!
//! ```
//! use modelgate::{Gateway, Provider};
//! use modelgate_cache::CacheLayer;
//! use modelgate_retry::RetryLayer;
//! use modelgate_timeout::TimeoutLayer;
//! use std::time::Duration;
//!
//! # use async_trait::async_trait;
//! # use modelgate_core::*;
//! # struct Stub;
//! # #[async_trait]
//! # impl Provider for Stub {
//! #     fn name(&self) -> &str { "stub" }
//! #     fn supports(&self, _kind: OpKind) -> bool { true }
//! # }
//! # async fn example() -> Result<(), LlmError> {
//! let gateway = Gateway::builder()
//!     .provider(Stub)
//!     .layer(TimeoutLayer::builder().timeout(Duration::from_secs(30)).build())
//!     .layer(RetryLayer::builder().max_retries(2).build())
//!     .layer(CacheLayer::builder().ttl(Duration::from_secs(600)).build())
//!     .build();
//!
//! let response = gateway.text(TextRequest::new("some-model", "hello")).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! Layer order is declaration order: the first layer sees the request
//! first and the response last. The composition above therefore bounds
//! the whole call (including retries) by the timeout, and retries cache
//! misses but never cache hits.

mod builder;
mod dispatch;
mod gateway;
mod observe;
mod provider;

pub use builder::GatewayBuilder;
pub use dispatch::{
    audio_handler, embeddings_handler, image_handler, stream_handler, structured_handler,
    text_handler, Lifted,
};
pub use gateway::Gateway;
pub use observe::{retry_metrics_listener, RetryMetricsListener};
pub use provider::{unsupported, Provider};

pub use modelgate_core as core;

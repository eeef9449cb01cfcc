//! The structured error model shared by every pipeline component.
//!
//! All failures crossing the chain are [`LlmError`]s carrying a kind from a
//! closed taxonomy, so callers can pattern-match without string inspection.
//! Non-taxonomy failures that arise inside a middleware (task join errors,
//! serialization errors) are wrapped exactly once as a [`MiddlewareError`]
//! preserved in the cause chain; taxonomy errors always pass through
//! untouched.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::op::OpKind;

/// Failure classification. Retryability is a property of the kind and can
/// be overridden per error at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// The provider or a local limiter rejected the call for rate reasons.
    RateLimit,
    /// A deadline elapsed before the call completed.
    Timeout,
    /// Transport-level failure (connection, DNS, TLS).
    Network,
    /// The provider returned an error or is unavailable.
    Provider,
    /// The requested model is unknown or unsuitable.
    Model,
    /// The request failed validation before dispatch.
    Validation,
    /// An internal invariant was violated.
    Invalid,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase identifier, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Provider => "provider",
            ErrorKind::Model => "model",
            ErrorKind::Validation => "validation",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether errors of this kind are retryable by default.
    pub fn default_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::RateLimit
        )
    }

    /// Classifies an error message by substring matching over lowercased
    /// text, with precedence Auth > RateLimit > Timeout > Provider >
    /// Network > Unknown.
    ///
    /// The classification is idempotent: feeding the identifier of the
    /// inferred kind back in yields the same kind.
    pub fn infer(message: &str) -> ErrorKind {
        let text = message.to_lowercase();
        const AUTH: &[&str] = &["auth", "unauthorized", "api key", "forbidden", "401", "403"];
        const RATE: &[&str] = &["rate limit", "rate_limit", "too many requests", "quota", "429"];
        const TIMEOUT: &[&str] = &["timeout", "timed out", "deadline"];
        const PROVIDER: &[&str] = &["provider", "internal server", "bad gateway", "overloaded", "500", "502", "503"];
        const NETWORK: &[&str] = &["network", "connection", "dns", "refused", "broken pipe"];

        let matches_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
        if matches_any(AUTH) {
            ErrorKind::Auth
        } else if matches_any(RATE) {
            ErrorKind::RateLimit
        } else if matches_any(TIMEOUT) {
            ErrorKind::Timeout
        } else if matches_any(PROVIDER) {
            ErrorKind::Provider
        } else if matches_any(NETWORK) {
            ErrorKind::Network
        } else {
            ErrorKind::Unknown
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type SharedCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The error type carried through the pipeline.
///
/// `LlmError` is `Clone` (the cause is reference-counted) so stream chunks
/// can carry one and retry bookkeeping never needs to fabricate errors.
#[derive(Debug, Clone)]
pub struct LlmError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    provider: Option<String>,
    model: Option<String>,
    http_status: Option<u16>,
    source: Option<SharedCause>,
}

impl LlmError {
    /// Creates an error with the kind's default retryability.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.default_retryable(),
            provider: None,
            model: None,
            http_status: None,
            source: None,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn provider_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Provider, message)
    }

    pub fn model_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Model, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Wraps a non-taxonomy failure that surfaced inside a middleware.
    ///
    /// The resulting error is `Unknown`/non-retryable with the
    /// [`MiddlewareError`] as its cause. Taxonomy errors must not be passed
    /// here — they pass through the chain unwrapped.
    pub fn from_middleware(wrap: MiddlewareError) -> Self {
        let message = wrap.to_string();
        Self::new(ErrorKind::Unknown, message).with_source(Arc::new(wrap))
    }

    /// Names the provider this error originated from.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Names the model involved in the failed call.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attaches the HTTP status reported by the provider.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Overrides the kind-derived retryability.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Attaches an underlying cause.
    pub fn with_source(mut self, source: SharedCause) -> Self {
        self.source = Some(source);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether a subsequent attempt may succeed without caller intervention.
    pub fn retryable(&self) -> bool {
        self.retryable
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_rate_limit(&self) -> bool {
        self.kind == ErrorKind::RateLimit
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(provider) = &self.provider {
            write!(f, " (provider: {provider})")?;
        }
        if let Some(status) = self.http_status {
            write!(f, " (http {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Context wrapper for a non-taxonomy failure crossing a middleware
/// boundary. Applied at most once per failure; the cause chain below it is
/// preserved for unwrapping.
#[derive(Debug, thiserror::Error)]
#[error("middleware {middleware} failed during {operation}: {source}")]
pub struct MiddlewareError {
    middleware: &'static str,
    operation: OpKind,
    at: Instant,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl MiddlewareError {
    pub fn new(
        middleware: &'static str,
        operation: OpKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            middleware,
            operation,
            at: Instant::now(),
            source: source.into(),
        }
    }

    pub fn middleware(&self) -> &'static str {
        self.middleware
    }

    pub fn operation(&self) -> OpKind {
        self.operation
    }

    /// When the wrap was applied.
    pub fn at(&self) -> Instant {
        self.at
    }
}

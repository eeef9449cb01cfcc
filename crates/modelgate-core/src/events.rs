//! Event-listener infrastructure shared by the middleware crates.
//!
//! Each middleware defines its own event enum (cache hits, breaker
//! transitions, retry attempts, ...) implementing [`GatewayEvent`], and its
//! config carries an [`EventListeners`] collection the caller can subscribe
//! to. Listener failures are isolated: a panicking listener never takes the
//! call path down with it.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An observability event emitted by a pipeline component.
pub trait GatewayEvent: Send + Sync + fmt::Debug {
    /// Short identifier of the event variant, e.g. `"cache_hit"`.
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;

    /// The configured name of the component instance that emitted it.
    fn component(&self) -> &str;
}

/// A subscriber for events of type `E`.
pub trait EventListener<E: GatewayEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// An ordered collection of listeners for one event type.
#[derive(Clone)]
pub struct EventListeners<E: GatewayEvent> {
    listeners: Vec<Arc<dyn EventListener<E>>>,
}

impl<E: GatewayEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Subscribes a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers an event to every listener. A panicking listener is caught
    /// so the remaining listeners still run and the call path survives.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if outcome.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    event_type = event.event_type(),
                    component = event.component(),
                    "event listener panicked"
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: GatewayEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a closure into an [`EventListener`].
pub struct FnListener<F>(pub F);

impl<E, F> EventListener<E> for FnListener<F>
where
    E: GatewayEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.0)(event)
    }
}

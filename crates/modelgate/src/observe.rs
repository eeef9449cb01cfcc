//! Bridges between component events and the metrics registry.

use std::sync::Arc;

use modelgate_core::{EventListener, GatewayEvent};
use modelgate_metrics::MetricsRegistry;
use modelgate_retry::RetryEvent;

/// An event listener that counts scheduled retries into a
/// [`MetricsRegistry`].
///
/// Attach it when building the retry layer:
///
/// ```
/// use modelgate::retry_metrics_listener;
/// use modelgate_metrics::MetricsRegistry;
/// use modelgate_retry::RetryLayer;
/// use std::sync::Arc;
///
/// let registry = Arc::new(MetricsRegistry::new());
/// let layer = RetryLayer::builder()
///     .max_retries(3)
///     .event_listener(retry_metrics_listener(Arc::clone(&registry)))
///     .build();
/// ```
pub fn retry_metrics_listener(registry: Arc<MetricsRegistry>) -> RetryMetricsListener {
    RetryMetricsListener { registry }
}

/// See [`retry_metrics_listener`].
pub struct RetryMetricsListener {
    registry: Arc<MetricsRegistry>,
}

impl EventListener<RetryEvent> for RetryMetricsListener {
    fn on_event(&self, event: &RetryEvent) {
        if event.event_type() == "backing_off" {
            self.registry.total().record_retry();
        }
    }
}

//! Per-provider health records.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use modelgate_core::EventListeners;

use crate::events::HealthEvent;

/// Point-in-time health of one provider.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    pub healthy: bool,
    pub last_check: Option<Instant>,
    pub last_error: Option<String>,
    pub response_time: Option<Duration>,
    pub consecutive_fails: u32,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            healthy: true,
            last_check: None,
            last_error: None,
            response_time: None,
            consecutive_fails: 0,
        }
    }
}

/// Shared registry of provider health, updated both in-band (call
/// outcomes) and out-of-band (periodic probes).
///
/// A provider turns unhealthy once its consecutive failures reach the
/// threshold (default 3) and healthy again on the first success. Records
/// sit behind a single reader/writer lock that is never held across an
/// await.
pub struct HealthRegistry {
    records: RwLock<HashMap<String, HealthRecord>>,
    unhealthy_threshold: u32,
    event_listeners: EventListeners<HealthEvent>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            unhealthy_threshold: 3,
            event_listeners: EventListeners::new(),
        }
    }

    /// Overrides the consecutive-failure count that flips a provider
    /// unhealthy.
    ///
    /// Default: 3
    pub fn unhealthy_threshold(mut self, threshold: u32) -> Self {
        self.unhealthy_threshold = threshold.max(1);
        self
    }

    /// Subscribes a listener for health transitions.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: modelgate_core::EventListener<HealthEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Ensures a record exists for the provider.
    pub fn track(&self, provider: impl Into<String>) {
        self.records
            .write()
            .unwrap()
            .entry(provider.into())
            .or_default();
    }

    /// Names of every tracked provider.
    pub fn names(&self) -> Vec<String> {
        self.records.read().unwrap().keys().cloned().collect()
    }

    /// A provider with no record yet counts as healthy.
    pub fn is_healthy(&self, provider: &str) -> bool {
        self.records
            .read()
            .unwrap()
            .get(provider)
            .map(|record| record.healthy)
            .unwrap_or(true)
    }

    pub fn snapshot(&self, provider: &str) -> Option<HealthRecord> {
        self.records.read().unwrap().get(provider).cloned()
    }

    /// Records a successful call or probe.
    pub fn report_success(&self, provider: &str, response_time: Duration) {
        let mut records = self.records.write().unwrap();
        let record = records.entry(provider.to_string()).or_default();
        let was_healthy = record.healthy;
        record.healthy = true;
        record.consecutive_fails = 0;
        record.last_check = Some(Instant::now());
        record.last_error = None;
        record.response_time = Some(response_time);
        drop(records);

        if !was_healthy {
            #[cfg(feature = "tracing")]
            tracing::info!(provider, "provider recovered");
            self.event_listeners.emit(&HealthEvent::BecameHealthy {
                provider: provider.to_string(),
                timestamp: Instant::now(),
            });
            #[cfg(feature = "metrics")]
            metrics::counter!("healthcheck_transitions_total", "provider" => provider.to_string(), "to" => "healthy").increment(1);
        }
    }

    /// Records a failed call or probe.
    pub fn report_failure(&self, provider: &str, error: &str) {
        let mut records = self.records.write().unwrap();
        let record = records.entry(provider.to_string()).or_default();
        let was_healthy = record.healthy;
        record.consecutive_fails += 1;
        record.last_check = Some(Instant::now());
        record.last_error = Some(error.to_string());
        if record.consecutive_fails >= self.unhealthy_threshold {
            record.healthy = false;
        }
        let now_unhealthy = !record.healthy;
        drop(records);

        self.event_listeners.emit(&HealthEvent::ProbeFailed {
            provider: provider.to_string(),
            timestamp: Instant::now(),
            error: error.to_string(),
        });

        if was_healthy && now_unhealthy {
            #[cfg(feature = "tracing")]
            tracing::warn!(provider, error, "provider marked unhealthy");
            self.event_listeners.emit(&HealthEvent::BecameUnhealthy {
                provider: provider.to_string(),
                timestamp: Instant::now(),
                error: error.to_string(),
            });
            #[cfg(feature = "metrics")]
            metrics::counter!("healthcheck_transitions_total", "provider" => provider.to_string(), "to" => "unhealthy").increment(1);
        }
    }

    /// Force-sets the healthy flag, bypassing the failure counters.
    pub fn set_healthy(&self, provider: &str, healthy: bool) {
        let mut records = self.records.write().unwrap();
        let record = records.entry(provider.to_string()).or_default();
        record.healthy = healthy;
        if healthy {
            record.consecutive_fails = 0;
        }
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

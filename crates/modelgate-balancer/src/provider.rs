//! Per-provider dispatch records.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use modelgate_core::BoxLlmService;

/// Smoothing factor of the latency moving average.
const LATENCY_SMOOTHING: f64 = 0.1;

/// One balanced dispatch target and its runtime statistics.
///
/// Counters are atomics; the latency average sits behind its own
/// reader/writer lock. Nothing here is held across the downstream call.
pub struct ProviderEntry {
    name: String,
    service: BoxLlmService,
    weight: u32,
    active: AtomicUsize,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    avg_latency: RwLock<Option<Duration>>,
    healthy: AtomicBool,
    last_health_check: RwLock<Option<Instant>>,
}

impl ProviderEntry {
    pub fn new(name: impl Into<String>, service: BoxLlmService) -> Self {
        Self {
            name: name.into(),
            service,
            weight: 1,
            active: AtomicUsize::new(0),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            avg_latency: RwLock::new(None),
            healthy: AtomicBool::new(true),
            last_health_check: RwLock::new(None),
        }
    }

    /// Sets the weight used by the weighted round-robin strategy.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub(crate) fn service(&self) -> BoxLlmService {
        self.service.clone()
    }

    /// Calls currently in flight through this provider.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    /// Fraction of completed calls that failed, in `[0, 1]`.
    pub fn error_rate(&self) -> f64 {
        let requests = self.total_requests();
        if requests == 0 {
            0.0
        } else {
            self.total_errors() as f64 / requests as f64
        }
    }

    /// Exponential moving average of call latency; zero until the first
    /// completion.
    pub fn average_latency(&self) -> Duration {
        self.avg_latency.read().unwrap().unwrap_or(Duration::ZERO)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Flips the manual healthy flag, stamping the check instant.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Release);
        *self.last_health_check.write().unwrap() = Some(Instant::now());
    }

    pub fn last_health_check(&self) -> Option<Instant> {
        *self.last_health_check.read().unwrap()
    }

    pub(crate) fn record_outcome(&self, latency: Duration, failed: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        let mut average = self.avg_latency.write().unwrap();
        *average = Some(match *average {
            None => latency,
            Some(current) => {
                let blended = current.as_secs_f64() * (1.0 - LATENCY_SMOOTHING)
                    + latency.as_secs_f64() * LATENCY_SMOOTHING;
                Duration::from_secs_f64(blended)
            }
        });
    }
}

/// Decrements the owner's active count when dropped, so cancellation and
/// completion release the slot the same way.
pub(crate) struct ActiveGuard {
    entry: Arc<ProviderEntry>,
}

impl ActiveGuard {
    pub(crate) fn acquire(entry: Arc<ProviderEntry>) -> Self {
        entry.active.fetch_add(1, Ordering::AcqRel);
        Self { entry }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.entry.active.fetch_sub(1, Ordering::AcqRel);
    }
}

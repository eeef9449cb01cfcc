//! Lock-free call counters and the fixed-bucket latency histogram.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use modelgate_core::Usage;

/// Upper bounds of the latency histogram, in milliseconds. These bounds
/// are part of the exposition contract; an overflow bucket follows.
pub const LATENCY_BUCKETS_MS: [u64; 6] = [10, 50, 100, 500, 1000, 5000];

/// Number of histogram slots: the fixed bounds plus overflow.
pub const BUCKET_COUNT: usize = LATENCY_BUCKETS_MS.len() + 1;

/// Fixed-bound latency histogram with atomic buckets.
#[derive(Debug, Default)]
pub struct LatencyHistogram {
    buckets: [AtomicU64; BUCKET_COUNT],
}

impl LatencyHistogram {
    pub fn record(&self, latency: Duration) {
        let millis = latency.as_millis() as u64;
        let slot = LATENCY_BUCKETS_MS
            .iter()
            .position(|&bound| millis <= bound)
            .unwrap_or(LATENCY_BUCKETS_MS.len());
        self.buckets[slot].fetch_add(1, Ordering::Relaxed);
    }

    /// Per-bucket (non-cumulative) counts, overflow last.
    pub fn counts(&self) -> [u64; BUCKET_COUNT] {
        let mut counts = [0u64; BUCKET_COUNT];
        for (slot, bucket) in self.buckets.iter().enumerate() {
            counts[slot] = bucket.load(Ordering::Relaxed);
        }
        counts
    }

    fn reset(&self) {
        for bucket in &self.buckets {
            bucket.store(0, Ordering::Relaxed);
        }
    }
}

/// Atomic counters for one aggregation bucket (global, per-label, or
/// per-kind). Every field is updated with lock-free atomics so concurrent
/// terminating calls never lose increments.
#[derive(Debug, Default)]
pub struct CallMetrics {
    requests: AtomicU64,
    errors: AtomicU64,
    retries: AtomicU64,
    duration_ns: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    latency: LatencyHistogram,
}

/// Point-in-time copy of a [`CallMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub retries: u64,
    pub duration_ns: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub latency_buckets: [u64; BUCKET_COUNT],
}

impl CallMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one terminated call.
    pub fn record_call(&self, latency: Duration, failed: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.duration_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        self.latency.record(latency);
    }

    pub fn record_usage(&self, usage: &Usage) {
        self.input_tokens
            .fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(usage.completion_tokens, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CallMetricsSnapshot {
        CallMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            duration_ns: self.duration_ns.load(Ordering::Relaxed),
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
            latency_buckets: self.latency.counts(),
        }
    }

    pub(crate) fn reset(&self) {
        self.requests.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.duration_ns.store(0, Ordering::Relaxed);
        self.input_tokens.store(0, Ordering::Relaxed);
        self.output_tokens.store(0, Ordering::Relaxed);
        self.latency.reset();
    }
}

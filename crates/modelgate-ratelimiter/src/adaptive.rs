//! Latency-driven rate adaptation.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::bucket::TokenBucket;
use crate::health::{composite_score, score_factor, HealthSignalFn};

/// Configuration of the adaptive controller.
pub struct AdaptiveConfig {
    pub(crate) target_latency: Duration,
    pub(crate) min_rate: f64,
    pub(crate) max_rate: f64,
    pub(crate) adjust_interval: Duration,
    pub(crate) window_size: usize,
    pub(crate) signal: Option<HealthSignalFn>,
}

impl AdaptiveConfig {
    /// Creates a controller configuration with the standard cadence: a
    /// 100-sample latency window consulted every 10 seconds.
    pub fn new(target_latency: Duration, min_rate: f64, max_rate: f64) -> Self {
        Self {
            target_latency,
            min_rate,
            max_rate,
            adjust_interval: Duration::from_secs(10),
            window_size: 100,
            signal: None,
        }
    }

    /// Overrides the adjustment cadence.
    pub fn adjust_interval(mut self, interval: Duration) -> Self {
        self.adjust_interval = interval;
        self
    }

    /// Overrides the latency window size.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(2);
        self
    }

    /// Attaches an external health signal; its score multiplies the
    /// latency-driven adjustment.
    pub fn health_signal(mut self, signal: HealthSignalFn) -> Self {
        self.signal = Some(signal);
        self
    }
}

struct Window {
    latencies: VecDeque<Duration>,
    last_adjust: Instant,
}

/// Rolling latency window plus the adjustment rule.
///
/// Every `adjust_interval`, if the window is at least half full, the mean
/// latency moves the rate: above 1.2x target shrinks it by 10%, below 0.8x
/// target grows it by 10%. When a health signal is attached its band factor
/// multiplies the result. The outcome is clamped to `[min_rate, max_rate]`.
pub(crate) struct AdaptiveController {
    config: AdaptiveConfig,
    window: Mutex<Window>,
}

impl AdaptiveController {
    pub(crate) fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            window: Mutex::new(Window {
                latencies: VecDeque::new(),
                last_adjust: Instant::now(),
            }),
        }
    }

    /// Records one completed-call latency and adjusts the bucket rate if
    /// the cadence allows. Returns `Some((old, new))` when the rate moved.
    pub(crate) fn record(&self, latency: Duration, bucket: &TokenBucket) -> Option<(f64, f64)> {
        let mut window = self.window.lock().unwrap();
        if window.latencies.len() == self.config.window_size {
            window.latencies.pop_front();
        }
        window.latencies.push_back(latency);

        if window.last_adjust.elapsed() < self.config.adjust_interval {
            return None;
        }
        if window.latencies.len() < self.config.window_size / 2 {
            return None;
        }
        window.last_adjust = Instant::now();

        let mean = window
            .latencies
            .iter()
            .sum::<Duration>()
            .div_f64(window.latencies.len() as f64);
        drop(window);

        let current = bucket.rate();
        let target = self.config.target_latency;
        let mut adjusted = if mean > target.mul_f64(1.2) {
            (current * 0.9).max(self.config.min_rate)
        } else if mean < target.mul_f64(0.8) {
            (current * 1.1).min(self.config.max_rate)
        } else {
            current
        };

        if let Some(signal) = &self.config.signal {
            adjusted *= score_factor(composite_score(&signal()));
        }
        adjusted = adjusted.clamp(self.config.min_rate, self.config.max_rate);

        if (adjusted - current).abs() > f64::EPSILON {
            bucket.set_rate(adjusted);
            Some((current, adjusted))
        } else {
            None
        }
    }
}

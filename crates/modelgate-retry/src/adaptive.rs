//! Outcome-driven delay adaptation.

use std::sync::Mutex;
use std::time::Duration;

/// A backoff source that tightens after sustained success and loosens
/// after sustained failure.
///
/// The current delay starts at `initial`. A run of `success_threshold`
/// consecutive successes divides it by the growth factor (floored at
/// `initial`); a run of `failure_threshold` consecutive failures
/// multiplies it (capped by the engine's max delay at scheduling time).
/// Either outcome resets the opposite run.
pub struct AdaptiveBackoff {
    initial: Duration,
    factor: f64,
    success_threshold: u32,
    failure_threshold: u32,
    state: Mutex<AdaptiveState>,
}

struct AdaptiveState {
    current: Duration,
    consecutive_ok: u32,
    consecutive_fail: u32,
}

impl AdaptiveBackoff {
    /// Creates an adaptive backoff with thresholds of 3 consecutive
    /// outcomes in either direction.
    pub fn new(initial: Duration, factor: f64) -> Self {
        Self {
            initial,
            factor: factor.max(1.0),
            success_threshold: 3,
            failure_threshold: 3,
            state: Mutex::new(AdaptiveState {
                current: initial,
                consecutive_ok: 0,
                consecutive_fail: 0,
            }),
        }
    }

    /// Overrides the consecutive-success run length.
    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold.max(1);
        self
    }

    /// Overrides the consecutive-failure run length.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// The delay the engine should schedule next.
    pub fn current_delay(&self) -> Duration {
        self.state.lock().unwrap().current
    }

    pub(crate) fn on_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_fail = 0;
        state.consecutive_ok += 1;
        if state.consecutive_ok >= self.success_threshold {
            state.consecutive_ok = 0;
            state.current = state.current.div_f64(self.factor).max(self.initial);
        }
    }

    pub(crate) fn on_failure(&self, cap: Duration) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_ok = 0;
        state.consecutive_fail += 1;
        if state.consecutive_fail >= self.failure_threshold {
            state.consecutive_fail = 0;
            state.current = state.current.mul_f64(self.factor).min(cap);
        }
    }
}

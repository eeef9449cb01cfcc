//! Health-aware rate scoring.
//!
//! The composite score folds three independent signals — circuit state,
//! health flag, and failure history — into a multiplicative factor on the
//! refill rate. Both functions are pure so the scoring is unit-testable
//! without any timing.

use modelgate_circuitbreaker::CircuitState;

/// Snapshot of the external health signals for one dispatch target.
///
/// Each field has one canonical source: the circuit state comes from the
/// breaker protecting the target, the healthy flag and consecutive-failure
/// count from the health registry, and the error rate from the balancer or
/// metrics counters.
#[derive(Debug, Clone, Copy)]
pub struct HealthSignal {
    pub circuit: CircuitState,
    pub healthy: bool,
    /// Fraction of recent calls that failed, in `[0, 1]`.
    pub error_rate: f64,
    pub consecutive_fails: u32,
}

impl HealthSignal {
    /// A fully healthy signal; scores 1.0.
    pub fn healthy() -> Self {
        Self {
            circuit: CircuitState::Closed,
            healthy: true,
            error_rate: 0.0,
            consecutive_fails: 0,
        }
    }
}

/// Produces a [`HealthSignal`] snapshot on demand.
pub type HealthSignalFn = std::sync::Arc<dyn Fn() -> HealthSignal + Send + Sync>;

/// Weighted composite in `[0, 1]`: circuit state (weight 4), healthy flag
/// (weight 3), error-rate complement (weight 2), geometric decay of the
/// consecutive-failure count (weight 1).
pub fn composite_score(signal: &HealthSignal) -> f64 {
    let circuit = match signal.circuit {
        CircuitState::Open => 0.0,
        CircuitState::HalfOpen => 0.5,
        CircuitState::Closed => 1.0,
    };
    let healthy = if signal.healthy { 1.0 } else { 0.0 };
    let errors = 1.0 - signal.error_rate.clamp(0.0, 1.0);
    let fails = 0.7f64.powi(signal.consecutive_fails.min(32) as i32);

    (4.0 * circuit + 3.0 * healthy + 2.0 * errors + fails) / 10.0
}

/// Maps a composite score onto a rate factor by band.
pub fn score_factor(score: f64) -> f64 {
    if score < 0.3 {
        0.5
    } else if score < 0.6 {
        0.75
    } else if score < 0.8 {
        0.9
    } else {
        1.0
    }
}

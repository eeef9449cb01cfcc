//! Selection strategies.
//!
//! `select` is pure over a snapshot of the healthy candidates, so every
//! strategy is unit-testable without services or timing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;

/// Latency horizon of the adaptive score: at or beyond this, the latency
/// term contributes nothing.
const ADAPTIVE_LATENCY_HORIZON: Duration = Duration::from_secs(5);

/// How the balancer picks among healthy providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Cycle through candidates in order.
    RoundRobin,
    /// Uniformly random candidate.
    Random,
    /// Fewest in-flight calls; first match on ties.
    LeastConnections,
    /// Round-robin where each candidate occupies `weight` slots.
    WeightedRoundRobin,
    /// Lowest average latency; first match on ties.
    ResponseTime,
    /// Highest blend of idleness, success rate, and latency headroom.
    Adaptive,
}

/// Snapshot of one healthy candidate at selection time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateView {
    pub weight: u32,
    pub active: usize,
    pub error_rate: f64,
    pub latency: Duration,
}

impl Strategy {
    /// Picks an index into `candidates`. `candidates` must be non-empty;
    /// the shared counter drives the round-robin variants.
    pub(crate) fn select(&self, candidates: &[CandidateView], counter: &AtomicUsize) -> usize {
        debug_assert!(!candidates.is_empty());
        match self {
            Strategy::RoundRobin => counter.fetch_add(1, Ordering::Relaxed) % candidates.len(),
            Strategy::Random => rand::rng().random_range(0..candidates.len()),
            Strategy::LeastConnections => candidates
                .iter()
                .enumerate()
                .min_by_key(|(_, view)| view.active)
                .map(|(index, _)| index)
                .unwrap_or(0),
            Strategy::WeightedRoundRobin => {
                let total: u64 = candidates.iter().map(|view| u64::from(view.weight)).sum();
                if total == 0 {
                    return counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
                }
                let ticket = (counter.fetch_add(1, Ordering::Relaxed) as u64) % total;
                let mut cumulative = 0u64;
                for (index, view) in candidates.iter().enumerate() {
                    cumulative += u64::from(view.weight);
                    if ticket < cumulative {
                        return index;
                    }
                }
                candidates.len() - 1
            }
            Strategy::ResponseTime => candidates
                .iter()
                .enumerate()
                .min_by_key(|(_, view)| view.latency)
                .map(|(index, _)| index)
                .unwrap_or(0),
            Strategy::Adaptive => {
                let mut best = 0;
                let mut best_score = f64::MIN;
                for (index, view) in candidates.iter().enumerate() {
                    let score = adaptive_score(view);
                    if score > best_score {
                        best = index;
                        best_score = score;
                    }
                }
                best
            }
        }
    }
}

/// `0.3 * 1/(active+1) + 0.4 * (1 - error_rate) + 0.3 * latency headroom`.
fn adaptive_score(view: &CandidateView) -> f64 {
    let idleness = 1.0 / (view.active as f64 + 1.0);
    let reliability = 1.0 - view.error_rate.clamp(0.0, 1.0);
    let headroom = (1.0
        - view.latency.as_secs_f64() / ADAPTIVE_LATENCY_HORIZON.as_secs_f64())
    .max(0.0);
    0.3 * idleness + 0.4 * reliability + 0.3 * headroom
}

//! Backoff family invariants.

use std::time::Duration;

use modelgate_retry::{apply_jitter, Backoff};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Exponential delays are non-decreasing up to the cap.
    #[test]
    fn exponential_is_monotone(
        initial_ms in 1u64..1000,
        factor in 1.0f64..4.0,
        max_ms in 1u64..60_000,
    ) {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(initial_ms),
            factor,
        };
        let max = Duration::from_millis(max_ms);
        let mut previous = Duration::ZERO;
        for attempt in 0..32 {
            let delay = backoff.delay_for(attempt, max);
            prop_assert!(delay >= previous);
            prop_assert!(delay <= max);
            previous = delay;
        }
    }

    /// Every family clamps to the configured maximum.
    #[test]
    fn all_families_clamp(initial_ms in 1u64..10_000, max_ms in 1u64..5_000) {
        let initial = Duration::from_millis(initial_ms);
        let max = Duration::from_millis(max_ms);
        for backoff in [
            Backoff::fixed(initial),
            Backoff::exponential(initial),
            Backoff::linear(initial),
            Backoff::fibonacci(initial),
        ] {
            for attempt in 0..64 {
                prop_assert!(backoff.delay_for(attempt, max) <= max);
            }
        }
    }

    /// Jitter stretches a delay by at most 30% and never shrinks it.
    #[test]
    fn jitter_band(delay_ms in 1u64..10_000) {
        let base = Duration::from_millis(delay_ms);
        let jittered = apply_jitter(base);
        prop_assert!(jittered >= base);
        prop_assert!(jittered < base.mul_f64(1.3) + Duration::from_nanos(1));
    }
}

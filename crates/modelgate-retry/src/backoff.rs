//! Backoff families.
//!
//! All delay computations are pure so callers can schedule waits
//! externally; the retry engine uses the same functions internally.

use std::time::Duration;

use rand::Rng;

/// A family of per-attempt delays, clamped to a maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed { delay: Duration },
    /// `initial * factor^attempt`.
    Exponential { initial: Duration, factor: f64 },
    /// `initial * (attempt + 1)`.
    Linear { initial: Duration },
    /// `initial * fib(attempt + 1)` over 1, 1, 2, 3, 5, ...
    Fibonacci { initial: Duration },
}

impl Backoff {
    /// Doubling exponential backoff.
    pub fn exponential(initial: Duration) -> Self {
        Backoff::Exponential {
            initial,
            factor: 2.0,
        }
    }

    pub fn linear(initial: Duration) -> Self {
        Backoff::Linear { initial }
    }

    pub fn fibonacci(initial: Duration) -> Self {
        Backoff::Fibonacci { initial }
    }

    pub fn fixed(delay: Duration) -> Self {
        Backoff::Fixed { delay }
    }

    /// The delay scheduled after the given 0-indexed attempt, clamped to
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32, max_delay: Duration) -> Duration {
        let delay = match *self {
            Backoff::Fixed { delay } => delay,
            Backoff::Exponential { initial, factor } => {
                let secs = initial.as_secs_f64() * factor.powi(attempt.min(64) as i32);
                Duration::try_from_secs_f64(secs).unwrap_or(max_delay)
            }
            Backoff::Linear { initial } => initial.saturating_mul(attempt.saturating_add(1)),
            Backoff::Fibonacci { initial } => initial.saturating_mul(fib(attempt.saturating_add(1))),
        };
        delay.min(max_delay)
    }
}

/// Fibonacci with saturation; `fib(1) = fib(2) = 1`.
fn fib(n: u32) -> u32 {
    let (mut a, mut b) = (0u32, 1u32);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// Multiplies a delay by `1 + U[0, 0.3)` to decorrelate clients.
pub fn apply_jitter(delay: Duration) -> Duration {
    let spread: f64 = rand::rng().random::<f64>() * 0.3;
    delay.mul_f64(1.0 + spread)
}

//! The token bucket and its waiting discipline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;

/// What to do when no token is immediately available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Join the bounded waiter queue and re-attempt on a ticker. A full
    /// queue fails immediately with a distinct error.
    Wait,
    /// Fail immediately.
    Reject,
}

/// Why an acquisition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// No token was available and the policy forbids waiting.
    Exhausted,
    /// The waiter queue is at capacity.
    QueueFull,
}

struct BucketState {
    rate: f64,
    tokens: f64,
    last_refill: Instant,
}

/// A token bucket with continuous refill.
///
/// Tokens accrue at `rate` per second up to `capacity`; each admitted call
/// consumes one. The refill-and-decrement critical section sits behind a
/// mutex; the clock is tokio time so tests can pause it.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(rate: f64, capacity: f64) -> Self {
        let rate = rate.max(f64::MIN_POSITIVE);
        Self {
            state: Mutex::new(BucketState {
                rate,
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
        }
    }

    /// Non-blocking acquisition: consumes a token if at least one is
    /// available after refill.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        Self::refill(&mut state, self.capacity);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(state: &mut BucketState, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + state.rate * elapsed).min(capacity);
        state.last_refill = now;
    }

    /// Current token level after refill. `0 <= available <= capacity`.
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock().unwrap();
        Self::refill(&mut state, self.capacity);
        state.tokens
    }

    pub fn rate(&self) -> f64 {
        self.state.lock().unwrap().rate
    }

    /// Replaces the refill rate. Accrual up to now happens at the old rate.
    pub fn set_rate(&self, rate: f64) {
        let mut state = self.state.lock().unwrap();
        Self::refill(&mut state, self.capacity);
        state.rate = rate.max(f64::MIN_POSITIVE);
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Period between waiter re-attempts: one token's worth of refill.
    fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.rate())
            .unwrap_or(Duration::from_secs(3600))
    }
}

/// A bucket plus its bounded waiter queue, shared by every service a layer
/// wraps.
#[derive(Clone)]
pub(crate) struct SharedBucket {
    bucket: Arc<TokenBucket>,
    waiters: Arc<Semaphore>,
    policy: QueuePolicy,
}

impl SharedBucket {
    pub(crate) fn new(rate: f64, capacity: f64, policy: QueuePolicy) -> Self {
        let slots = (capacity.ceil() as usize).max(1);
        Self {
            bucket: Arc::new(TokenBucket::new(rate, capacity)),
            waiters: Arc::new(Semaphore::new(slots)),
            policy,
        }
    }

    pub(crate) fn bucket(&self) -> &Arc<TokenBucket> {
        &self.bucket
    }

    /// Acquires a token according to the queue policy. Returns how long the
    /// caller waited. Dropping the returned future surrenders the queue
    /// slot immediately.
    pub(crate) async fn acquire(&self) -> Result<Duration, AcquireError> {
        if self.bucket.try_acquire() {
            return Ok(Duration::ZERO);
        }
        if self.policy == QueuePolicy::Reject {
            return Err(AcquireError::Exhausted);
        }

        // The permit bounds the queue; it is released on return or drop.
        let _slot = match Arc::clone(&self.waiters).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => return Err(AcquireError::QueueFull),
        };

        let started = Instant::now();
        loop {
            tokio::time::sleep(self.bucket.tick_period()).await;
            if self.bucket.try_acquire() {
                return Ok(started.elapsed());
            }
        }
    }
}

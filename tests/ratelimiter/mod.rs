//! Comprehensive tests for the rate limiter middleware, on paused tokio
//! time.
//!
//! Test organization:
//! - admission.rs: burst admission, wait spacing, the throughput bound
//! - queueing.rs: queue-full rejection, the reject policy, slot release
//!   on cancellation

mod admission;
mod queueing;

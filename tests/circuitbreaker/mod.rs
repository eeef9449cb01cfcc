//! Comprehensive tests for the circuit breaker middleware.
//!
//! Test organization:
//! - thresholds.rs: opening at the failure threshold, fail-fast rejection
//! - half_open.rs: probing, recovery, re-opening, and the timer knob

mod half_open;
mod thresholds;

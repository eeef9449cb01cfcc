//! Comprehensive tests for the retry middleware.
//!
//! Test organization:
//! - behavior.rs: attempt counting, the retry bound, predicate gating
//! - adaptive.rs: outcome-driven delay adaptation

mod adaptive;
mod behavior;

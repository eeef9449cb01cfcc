//! Full-pipeline composition through the gateway facade.
//!
//! Exercises the documented stack order — timeout, retry, rate limit,
//! breaker, cache, metrics, health — around mock providers.
//!
//! Test organization:
//! - test_utils.rs: the mock provider and the standard stack
//! - full_stack.rs: text and streaming through the whole pipeline
//! - balanced.rs: balanced dispatch and the capability probe

mod balanced;
mod full_stack;
mod test_utils;

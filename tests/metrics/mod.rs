//! Comprehensive tests for the metrics middleware and registry.
//!
//! Test organization:
//! - counting.rs: counter atomicity, error-kind buckets and inference
//! - streaming.rs: bookkeeping at stream termination
//! - exposition.rs: the text and JSON renderings

mod counting;
mod exposition;
mod streaming;

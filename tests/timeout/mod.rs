//! Comprehensive tests for the timeout middleware, on paused tokio time.
//!
//! Test organization:
//! - deadline.rs: unary deadline enforcement and error shape
//! - streaming.rs: the stream-aware deadline wrapper

mod deadline;
mod streaming;

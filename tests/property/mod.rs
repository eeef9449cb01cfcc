//! Property test organization:
//! - backoff.rs: delay families are monotone and clamped
//! - bucket.rs: token level stays within `[0, capacity]`
//! - retry.rs: attempt counts never exceed the bound
//! - cache.rs: capacity is never exceeded; hits equal stored values

mod backoff;
mod cache;
mod retry;

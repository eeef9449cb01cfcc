//! Call metrics for modelgate.
//!
//! A [`MetricsRegistry`] aggregates lock-free counters three ways at once:
//! a process-wide total, buckets keyed by the (provider, model, method,
//! error_kind) label tuple, and per-operation-kind triples. The
//! [`MetricsLayer`] middleware feeds it; [`render_text`] and
//! [`render_json`] expose it.
//!
//! Stream calls are special-cased: their counters book when the chunk
//! sequence terminates (producer close, error chunk, or consumer drop),
//! not when the handler returns — a cached or cancelled call therefore
//! never double-counts.
//!
//! [`render_text`]: MetricsRegistry::render_text
//! [`render_json`]: MetricsRegistry::render_json

mod collector;
mod export;
mod layer;
mod registry;
mod typed;

pub use collector::{
    CallMetrics, CallMetricsSnapshot, LatencyHistogram, BUCKET_COUNT, LATENCY_BUCKETS_MS,
};
pub use layer::{Metrics, MetricsLayer};
pub use registry::{error_kind_label, LabelSet, MetricsRegistry};
pub use typed::{KindMetrics, KindSnapshot};

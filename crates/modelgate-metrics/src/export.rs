//! Exposition formats.
//!
//! Two renderings of the same registry: a line-oriented text form with
//! `modelgate_*` namespaced counters and histograms (bucket bounds are
//! part of the contract), and a nested JSON form.

use std::fmt::Write as _;

use crate::collector::{CallMetricsSnapshot, LATENCY_BUCKETS_MS};
use crate::registry::{LabelSet, MetricsRegistry};

impl MetricsRegistry {
    /// Renders counter and histogram lines with label suffixes.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let total = self.total().snapshot();
        write_counters(&mut out, "", &total);
        write_histogram(&mut out, "", &total);

        let mut buckets = self.label_buckets();
        buckets.sort_by(|(a, _), (b, _)| format_labels(a).cmp(&format_labels(b)));
        for (labels, metrics) in buckets {
            let suffix = format_labels(&labels);
            let snapshot = metrics.snapshot();
            write_counters(&mut out, &suffix, &snapshot);
            write_histogram(&mut out, &suffix, &snapshot);
        }

        for kind in self.kinds().snapshots() {
            if kind.requests == 0 {
                continue;
            }
            let suffix = format!("{{method=\"{}\"}}", kind.kind.as_str());
            let _ = writeln!(out, "modelgate_op_requests_total{suffix} {}", kind.requests);
            let _ = writeln!(out, "modelgate_op_errors_total{suffix} {}", kind.errors);
            let _ = writeln!(
                out,
                "modelgate_op_duration_nanoseconds_total{suffix} {}",
                kind.duration_ns
            );
        }

        out
    }

    /// Renders the nested structured form.
    pub fn render_json(&self) -> serde_json::Value {
        let total = self.total().snapshot();
        let buckets: Vec<serde_json::Value> = self
            .label_buckets()
            .into_iter()
            .map(|(labels, metrics)| {
                let snapshot = metrics.snapshot();
                serde_json::json!({
                    "provider": labels.provider,
                    "model": labels.model,
                    "method": labels.method,
                    "error_kind": labels.error_kind,
                    "metrics": snapshot_json(&snapshot),
                })
            })
            .collect();
        let kinds: Vec<serde_json::Value> = self
            .kinds()
            .snapshots()
            .into_iter()
            .filter(|snapshot| snapshot.requests > 0)
            .map(|snapshot| {
                serde_json::json!({
                    "method": snapshot.kind.as_str(),
                    "requests": snapshot.requests,
                    "errors": snapshot.errors,
                    "duration_ns": snapshot.duration_ns,
                })
            })
            .collect();

        serde_json::json!({
            "total": snapshot_json(&total),
            "buckets": buckets,
            "operations": kinds,
        })
    }
}

fn snapshot_json(snapshot: &CallMetricsSnapshot) -> serde_json::Value {
    let histogram: Vec<serde_json::Value> = LATENCY_BUCKETS_MS
        .iter()
        .map(|bound| bound.to_string())
        .chain(std::iter::once(String::from("+Inf")))
        .zip(snapshot.latency_buckets.iter())
        .map(|(le_ms, count)| serde_json::json!({"le_ms": le_ms, "count": count}))
        .collect();
    serde_json::json!({
        "requests": snapshot.requests,
        "errors": snapshot.errors,
        "retries": snapshot.retries,
        "duration_ns": snapshot.duration_ns,
        "input_tokens": snapshot.input_tokens,
        "output_tokens": snapshot.output_tokens,
        "latency": histogram,
    })
}

fn format_labels(labels: &LabelSet) -> String {
    let mut parts = vec![
        format!("provider=\"{}\"", labels.provider),
        format!("model=\"{}\"", labels.model),
        format!("method=\"{}\"", labels.method),
    ];
    if let Some(kind) = labels.error_kind {
        parts.push(format!("error_kind=\"{kind}\""));
    }
    format!("{{{}}}", parts.join(","))
}

fn write_counters(out: &mut String, suffix: &str, snapshot: &CallMetricsSnapshot) {
    let _ = writeln!(out, "modelgate_requests_total{suffix} {}", snapshot.requests);
    let _ = writeln!(out, "modelgate_errors_total{suffix} {}", snapshot.errors);
    let _ = writeln!(out, "modelgate_retries_total{suffix} {}", snapshot.retries);
    let _ = writeln!(
        out,
        "modelgate_duration_nanoseconds_total{suffix} {}",
        snapshot.duration_ns
    );
    let _ = writeln!(
        out,
        "modelgate_input_tokens_total{suffix} {}",
        snapshot.input_tokens
    );
    let _ = writeln!(
        out,
        "modelgate_output_tokens_total{suffix} {}",
        snapshot.output_tokens
    );
}

/// Histogram lines are cumulative, prometheus-style, with `le` bounds in
/// seconds.
fn write_histogram(out: &mut String, suffix: &str, snapshot: &CallMetricsSnapshot) {
    let mut cumulative = 0u64;
    for (bound_ms, count) in LATENCY_BUCKETS_MS.iter().zip(snapshot.latency_buckets.iter()) {
        cumulative += count;
        let le = *bound_ms as f64 / 1000.0;
        let _ = writeln!(
            out,
            "modelgate_latency_seconds_bucket{} {cumulative}",
            merge_label(suffix, &format!("le=\"{le}\""))
        );
    }
    cumulative += snapshot.latency_buckets[snapshot.latency_buckets.len() - 1];
    let _ = writeln!(
        out,
        "modelgate_latency_seconds_bucket{} {cumulative}",
        merge_label(suffix, "le=\"+Inf\"")
    );
}

/// Splices an extra label into an existing `{...}` suffix.
fn merge_label(suffix: &str, label: &str) -> String {
    if suffix.is_empty() {
        format!("{{{label}}}")
    } else {
        format!("{},{label}}}", &suffix[..suffix.len() - 1])
    }
}

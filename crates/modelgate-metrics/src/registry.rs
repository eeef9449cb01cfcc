//! Labeled aggregation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use modelgate_core::{ErrorKind, LlmError, OpKind};

use crate::collector::CallMetrics;
use crate::typed::KindMetrics;

/// The label tuple metrics are partitioned by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSet {
    pub provider: String,
    pub model: String,
    pub method: &'static str,
    /// Set only on error buckets.
    pub error_kind: Option<&'static str>,
}

impl LabelSet {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, method: OpKind) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            method: method.as_str(),
            error_kind: None,
        }
    }

    /// The same labels with the error kind filled in.
    pub fn with_error(&self, kind: &'static str) -> Self {
        Self {
            provider: self.provider.clone(),
            model: self.model.clone(),
            method: self.method,
            error_kind: Some(kind),
        }
    }
}

/// Derives the error-kind label: the taxonomy kind when known, otherwise
/// inferred from the message text.
pub fn error_kind_label(error: &LlmError) -> &'static str {
    if error.kind() == ErrorKind::Unknown {
        ErrorKind::infer(error.message()).as_str()
    } else {
        error.kind().as_str()
    }
}

/// Process-lifetime metrics: a global collector, a per-label map, and
/// per-kind triples. The per-bucket map sits behind a reader/writer lock;
/// the collectors themselves are lock-free.
pub struct MetricsRegistry {
    total: CallMetrics,
    by_label: RwLock<HashMap<LabelSet, Arc<CallMetrics>>>,
    by_kind: KindMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            total: CallMetrics::new(),
            by_label: RwLock::new(HashMap::new()),
            by_kind: KindMetrics::new(),
        }
    }

    /// The unlabeled global collector.
    pub fn total(&self) -> &CallMetrics {
        &self.total
    }

    /// Per-kind triples.
    pub fn kinds(&self) -> &KindMetrics {
        &self.by_kind
    }

    /// The collector for one label tuple, created on first use.
    pub fn labeled(&self, labels: &LabelSet) -> Arc<CallMetrics> {
        if let Some(existing) = self.by_label.read().unwrap().get(labels) {
            return Arc::clone(existing);
        }
        let mut map = self.by_label.write().unwrap();
        Arc::clone(
            map.entry(labels.clone())
                .or_insert_with(|| Arc::new(CallMetrics::new())),
        )
    }

    /// Every label tuple seen so far, with its collector.
    pub fn label_buckets(&self) -> Vec<(LabelSet, Arc<CallMetrics>)> {
        self.by_label
            .read()
            .unwrap()
            .iter()
            .map(|(labels, metrics)| (labels.clone(), Arc::clone(metrics)))
            .collect()
    }

    /// Clears every counter and label bucket.
    pub fn reset(&self) {
        self.total.reset();
        self.by_kind.reset();
        self.by_label.write().unwrap().clear();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

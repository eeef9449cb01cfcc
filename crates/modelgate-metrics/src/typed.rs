//! Per-operation-kind counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use modelgate_core::OpKind;

/// A requests/errors/duration triple for each operation kind, enabling
/// per-kind reporting without label lookups.
#[derive(Debug, Default)]
pub struct KindMetrics {
    slots: [KindSlot; 6],
}

#[derive(Debug, Default)]
struct KindSlot {
    requests: AtomicU64,
    errors: AtomicU64,
    duration_ns: AtomicU64,
}

/// Snapshot of one kind's triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSnapshot {
    pub kind: OpKind,
    pub requests: u64,
    pub errors: u64,
    pub duration_ns: u64,
}

fn slot_index(kind: OpKind) -> usize {
    OpKind::ALL
        .iter()
        .position(|&candidate| candidate == kind)
        .expect("every kind is in ALL")
}

impl KindMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: OpKind, latency: Duration, failed: bool) {
        let slot = &self.slots[slot_index(kind)];
        slot.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            slot.errors.fetch_add(1, Ordering::Relaxed);
        }
        slot.duration_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, kind: OpKind) -> KindSnapshot {
        let slot = &self.slots[slot_index(kind)];
        KindSnapshot {
            kind,
            requests: slot.requests.load(Ordering::Relaxed),
            errors: slot.errors.load(Ordering::Relaxed),
            duration_ns: slot.duration_ns.load(Ordering::Relaxed),
        }
    }

    pub fn snapshots(&self) -> Vec<KindSnapshot> {
        OpKind::ALL.iter().map(|&kind| self.snapshot(kind)).collect()
    }

    pub(crate) fn reset(&self) {
        for slot in &self.slots {
            slot.requests.store(0, Ordering::Relaxed);
            slot.errors.store(0, Ordering::Relaxed);
            slot.duration_ns.store(0, Ordering::Relaxed);
        }
    }
}

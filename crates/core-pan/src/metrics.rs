//! Pan/layout counters.
//!
//! Relaxed atomics so a snapshot can be taken through a shared reference
//! (for example from a diagnostics hook holding the `SharedPanStrategy`
//! lock only briefly). Counts are monotonic for the lifetime of the engine.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PanMetrics {
    /// Calls to `set_content`, including the re-layout done by `set_display_size`.
    pub content_sets: AtomicU64,
    /// Words moved to the next row by the wrap reflow.
    pub rewraps: AtomicU64,
    /// Layout passes that applied the multi-row spacing transform.
    pub spacing_applied: AtomicU64,
    /// Multi-row layout passes that skipped spacing (odd geometry).
    pub spacing_skipped: AtomicU64,
    /// Successful `next` pans.
    pub pans_next: AtomicU64,
    /// Successful `previous` pans.
    pub pans_previous: AtomicU64,
    /// `next`/`previous` calls refused at a content boundary.
    pub pan_rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanMetricsSnapshot {
    pub content_sets: u64,
    pub rewraps: u64,
    pub spacing_applied: u64,
    pub spacing_skipped: u64,
    pub pans_next: u64,
    pub pans_previous: u64,
    pub pan_rejected: u64,
}

impl PanMetrics {
    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PanMetricsSnapshot {
        PanMetricsSnapshot {
            content_sets: self.content_sets.load(Ordering::Relaxed),
            rewraps: self.rewraps.load(Ordering::Relaxed),
            spacing_applied: self.spacing_applied.load(Ordering::Relaxed),
            spacing_skipped: self.spacing_skipped.load(Ordering::Relaxed),
            pans_next: self.pans_next.load(Ordering::Relaxed),
            pans_previous: self.pans_previous.load(Ordering::Relaxed),
            pan_rejected: self.pan_rejected.load(Ordering::Relaxed),
        }
    }
}

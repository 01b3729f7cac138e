//! Shared health state for the /health endpoint.
//! Updated by the ingest handler and RecordWriter.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Records appended since startup.
    records_written: AtomicU64,
    /// Records accepted by the ingest endpoint but not yet picked up by the writer.
    write_queue_pending: AtomicU64,
    /// `created_at` (Unix ms) of the last appended record, 0 = none.
    last_record_at_ms: AtomicI64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_write_queue_pending(&self) {
        self.write_queue_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_write_queue_pending(&self) {
        let _ = self
            .write_queue_pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    pub fn record_written(&self, created_at_ms: i64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.last_record_at_ms.store(created_at_ms, Ordering::Relaxed);
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn write_queue_pending(&self) -> u64 {
        self.write_queue_pending.load(Ordering::Relaxed)
    }

    pub fn last_record_at_ms(&self) -> Option<i64> {
        match self.last_record_at_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }
}

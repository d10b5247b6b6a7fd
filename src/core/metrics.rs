//! Engine metrics
//!
//! Counters for monitoring logger health: queue pressure, hard-cap
//! eviction, and transport failures. All counters are atomic and readable
//! while the engine runs.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Events accepted by policy and appended to the queue
    events_queued: AtomicU64,

    /// Events discarded by hard-capacity eviction
    events_evicted: AtomicU64,

    /// Batches handed to the dispatcher
    batches_flushed: AtomicU64,

    /// Transport write/flush invocations that returned an error or panicked
    transport_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            events_queued: AtomicU64::new(0),
            events_evicted: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn events_queued(&self) -> u64 {
        self.events_queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_evicted(&self) -> u64 {
        self.events_evicted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_queued(&self) {
        self.events_queued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_evicted(&self, count: u64) {
        if count > 0 {
            self.events_evicted.fetch_add(count, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_batch_flushed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.events_queued.store(0, Ordering::Relaxed);
        self.events_evicted.store(0, Ordering::Relaxed);
        self.batches_flushed.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            events_queued: AtomicU64::new(self.events_queued()),
            events_evicted: AtomicU64::new(self.events_evicted()),
            batches_flushed: AtomicU64::new(self.batches_flushed()),
            transport_failures: AtomicU64::new(self.transport_failures()),
        }
    }
}

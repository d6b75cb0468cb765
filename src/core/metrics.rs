//! Router metrics for observability
//!
//! Counters for monitoring routing and delivery health. All counters are
//! atomic; `Clone` takes a point-in-time snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a routing core (per-destination decision + write)
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Records accepted and written
    accepted: AtomicU64,

    /// Records rejected by the severity/scope gate
    rejected: AtomicU64,

    /// Records accepted by the gate but suppressed by sampling
    sampled_out: AtomicU64,

    /// Write attempts that failed
    write_errors: AtomicU64,
}

impl RouterMetrics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            sampled_out: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sampled_out(&self) -> u64 {
        self.sampled_out.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sampled_out(&self) {
        self.sampled_out.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clone for RouterMetrics {
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.accepted()),
            rejected: AtomicU64::new(self.rejected()),
            sampled_out: AtomicU64::new(self.sampled_out()),
            write_errors: AtomicU64::new(self.write_errors()),
        }
    }
}

/// Metrics for the asynchronous reporting core
#[derive(Debug, Default)]
pub struct ReportMetrics {
    /// Queue entries accepted by try-enqueue
    enqueued: AtomicU64,

    /// Reports handed to the backend transport successfully
    delivered: AtomicU64,

    /// Records dropped because the backlog was saturated
    dropped_full: AtomicU64,

    /// Writes accepted and discarded after stop
    discarded_after_stop: AtomicU64,

    /// Delivery attempts that failed after retries were exhausted
    delivery_failures: AtomicU64,
}

impl ReportMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped_full: AtomicU64::new(0),
            discarded_after_stop: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_full(&self) -> u64 {
        self.dropped_full.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded_after_stop(&self) -> u64 {
        self.discarded_after_stop.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped_full(&self) -> u64 {
        self.dropped_full.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_discarded_after_stop(&self) {
        self.discarded_after_stop.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clone for ReportMetrics {
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            delivered: AtomicU64::new(self.delivered()),
            dropped_full: AtomicU64::new(self.dropped_full()),
            discarded_after_stop: AtomicU64::new(self.discarded_after_stop()),
            delivery_failures: AtomicU64::new(self.delivery_failures()),
        }
    }
}

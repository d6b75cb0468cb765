//! Duplicate-message sampling for high-volume scenarios
//!
//! Suppresses repeated identical messages per one-second window: the first
//! `initial` occurrences of a message always pass, then one of every
//! `thereafter` passes, and the allowance resets when a new window starts.
//! Records are keyed by message text only, so two records with the same
//! message but different fields are sampled together.
//!
//! # Example
//!
//! ```
//! use rust_log_router::core::sampling::{Sampler, SamplingConfig};
//!
//! let sampler = Sampler::new(SamplingConfig { initial: 2, thereafter: 5 });
//! assert!(sampler.check("connection reset"));
//! assert!(sampler.check("connection reset"));
//! assert!(!sampler.check("connection reset"));
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for duplicate-message sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Number of identical messages that always pass per window.
    ///
    /// Zero or negative disables sampling entirely (everything passes).
    pub initial: i64,

    /// After the initial allowance, one of every `thereafter` messages
    /// passes per window. Zero or negative suppresses everything past the
    /// initial allowance.
    pub thereafter: i64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            initial: 100,
            thereafter: 100,
        }
    }
}

impl SamplingConfig {
    /// A configuration that disables sampling.
    pub fn disabled() -> Self {
        Self {
            initial: 0,
            thereafter: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.initial > 0
    }
}

/// Metrics for sampling observability
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    suppressed_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            suppressed_count: AtomicU64::new(0),
        }
    }

    /// Entries that passed sampling
    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    /// Entries suppressed by sampling
    #[inline]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count.load(Ordering::Relaxed)
    }

    #[inline]
    fn record_sampled(&self) {
        self.sampled_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_suppressed(&self) {
        self.suppressed_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Per-message counter bucketed into one-second windows
#[derive(Debug)]
struct WindowCounter {
    window: AtomicU64,
    count: AtomicU64,
}

impl WindowCounter {
    fn new(window: u64) -> Self {
        Self {
            window: AtomicU64::new(window),
            count: AtomicU64::new(0),
        }
    }

    /// Increment the counter for `window`, resetting when a new window
    /// starts, and return the occurrence number (1-based).
    ///
    /// The reset uses compare-exchange so exactly one thread clears the
    /// count at a window boundary; the fetch_add guarantees the initial-N
    /// allowance is never exceeded under concurrent bursts.
    fn bump(&self, window: u64) -> u64 {
        let current = self.window.load(Ordering::Acquire);
        if current != window
            && self
                .window
                .compare_exchange(current, window, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.count.store(0, Ordering::Release);
        }
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Duplicate-message sampler
///
/// Thread-safe: the counter map is read-mostly, counters are atomic.
/// Counter state is created at construction and lives for the process.
pub struct Sampler {
    config: SamplingConfig,
    epoch: Instant,
    counters: RwLock<HashMap<String, Arc<WindowCounter>>>,
    metrics: SamplerMetrics,
}

impl Sampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            counters: RwLock::new(HashMap::new()),
            metrics: SamplerMetrics::new(),
        }
    }

    /// Decide whether a message passes sampling for the current window.
    pub fn check(&self, message: &str) -> bool {
        if !self.config.is_enabled() {
            return true;
        }
        self.check_at(self.epoch.elapsed().as_secs(), message)
    }

    /// Window-explicit variant of [`check`](Self::check); the window index is
    /// seconds since sampler construction.
    pub(crate) fn check_at(&self, window: u64, message: &str) -> bool {
        let counter = self.counter_for(message, window);
        let n = counter.bump(window);

        let initial = self.config.initial as u64;
        let pass = if n <= initial {
            true
        } else if self.config.thereafter <= 0 {
            false
        } else {
            (n - initial) % self.config.thereafter as u64 == 0
        };

        if pass {
            self.metrics.record_sampled();
        } else {
            self.metrics.record_suppressed();
        }
        pass
    }

    fn counter_for(&self, message: &str, window: u64) -> Arc<WindowCounter> {
        if let Some(counter) = self.counters.read().get(message) {
            return Arc::clone(counter);
        }
        let mut counters = self.counters.write();
        Arc::clone(
            counters
                .entry(message.to_string())
                .or_insert_with(|| Arc::new(WindowCounter::new(window))),
        )
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish()
    }
}

//! Pipeline metrics for observability
//!
//! Counters for monitoring delivery health: how many records were
//! accepted, written, filtered by level or lost to sink failures, how often
//! producers hit a full queue, and how many records are still in flight.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for pipeline observability
///
/// `outstanding` rises when a record is accepted and falls once the sink
/// write for it has returned, whatever the outcome.
///
/// # Example
///
/// ```
/// use rust_log_pipeline::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
///
/// metrics.record_accepted();
/// assert_eq!(metrics.outstanding(), 1);
///
/// metrics.record_written();
/// assert_eq!(metrics.outstanding(), 0);
/// assert_eq!(metrics.total_written(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Records that passed the level gate and entered the pipeline
    accepted: AtomicU64,

    /// Records the sink wrote successfully
    written: AtomicU64,

    /// Records whose sink write failed
    write_failures: AtomicU64,

    /// Records dropped by the level gate
    filtered: AtomicU64,

    /// Times a producer found the queue full and had to wait
    queue_full_events: AtomicU64,

    /// Accepted records whose sink write has not returned yet
    outstanding: AtomicU64,
}

impl PipelineMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            outstanding: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Record a record entering the pipeline
    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.accepted.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful sink write
    #[inline]
    pub fn record_written(&self) -> u64 {
        let previous = self.written.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        previous
    }

    /// Record a failed sink write
    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        let previous = self.write_failures.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
        previous
    }

    /// Undo an acceptance whose enqueue never happened
    #[inline]
    pub fn record_rejected(&self) {
        self.accepted.fetch_sub(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    /// Record a record dropped by the level gate
    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a producer waiting on a full queue
    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the write failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been delivered yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.total_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            accepted: AtomicU64::new(self.total_accepted()),
            written: AtomicU64::new(self.total_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            filtered: AtomicU64::new(self.filtered_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            outstanding: AtomicU64::new(self.outstanding()),
        }
    }
}

//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps the per-interval counters to
/// get a consistent snapshot.
pub struct Metrics {
    /// Total check-ins ever processed (monotonic)
    checkins_total: AtomicU64,
    /// Check-ins since last report (reset on report)
    checkins_since_report: AtomicU64,
    /// Decisions marked Present (monotonic)
    present_total: AtomicU64,
    /// Decisions marked Absent (monotonic)
    absent_total: AtomicU64,
    /// Check-ins rejected with an error (monotonic)
    rejected_total: AtomicU64,
    /// Sessions started (monotonic)
    sessions_started_total: AtomicU64,
    /// Sum of decision latencies in microseconds (reset on report)
    decide_latency_sum_us: AtomicU64,
    /// Max decision latency in microseconds (reset on report)
    decide_latency_max_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            checkins_total: AtomicU64::new(0),
            checkins_since_report: AtomicU64::new(0),
            present_total: AtomicU64::new(0),
            absent_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            sessions_started_total: AtomicU64::new(0),
            decide_latency_sum_us: AtomicU64::new(0),
            decide_latency_max_us: AtomicU64::new(0),
        }
    }

    pub fn record_checkin_processed(&self, latency_us: u64) {
        self.checkins_total.fetch_add(1, Ordering::Relaxed);
        self.checkins_since_report.fetch_add(1, Ordering::Relaxed);
        self.decide_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.decide_latency_max_us, latency_us);
    }

    pub fn record_present(&self) {
        self.present_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_absent(&self) {
        self.absent_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot counters, resetting the per-interval ones
    pub fn report(&self) -> MetricsSummary {
        let since_report = self.checkins_since_report.swap(0, Ordering::Relaxed);
        let latency_sum_us = self.decide_latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency_us = self.decide_latency_max_us.swap(0, Ordering::Relaxed);

        let avg_latency_us =
            if since_report > 0 { latency_sum_us / since_report } else { 0 };

        MetricsSummary {
            checkins_total: self.checkins_total.load(Ordering::Relaxed),
            checkins_since_report: since_report,
            present_total: self.present_total.load(Ordering::Relaxed),
            absent_total: self.absent_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            sessions_started_total: self.sessions_started_total.load(Ordering::Relaxed),
            avg_latency_us,
            max_latency_us,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at report time
#[derive(Debug, Clone, Copy)]
pub struct MetricsSummary {
    pub checkins_total: u64,
    pub checkins_since_report: u64,
    pub present_total: u64,
    pub absent_total: u64,
    pub rejected_total: u64,
    pub sessions_started_total: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            checkins_total = %self.checkins_total,
            checkins_interval = %self.checkins_since_report,
            present = %self.present_total,
            absent = %self.absent_total,
            rejected = %self.rejected_total,
            sessions = %self.sessions_started_total,
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            "metrics_report"
        );
    }
}

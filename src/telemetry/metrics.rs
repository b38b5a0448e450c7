//! Metrics collection for the delayed executor.

use crate::error::{Error, Result};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Executor metrics collector
#[derive(Debug)]
pub struct Metrics {
    // Task counters
    tasks_scheduled: AtomicU64,
    tasks_executed: AtomicU64,
    tasks_canceled: AtomicU64,
    tasks_discarded: AtomicU64,
    tasks_panicked: AtomicU64,

    // Time spent inside actions
    busy_time_ns: AtomicU64,

    // How far past its deadline each task started
    lateness_histogram: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self> {
        // auto-resizing, 3 significant figures
        let histogram = Histogram::new(3)
            .map_err(|e| Error::telemetry(format!("histogram creation failed: {}", e)))?;

        Ok(Self {
            tasks_scheduled: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_canceled: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            lateness_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        })
    }

    pub fn record_task_scheduled(&self) {
        self.tasks_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an executed task: lateness past its deadline and run time.
    pub fn record_task_execution(&self, lateness_ns: u64, duration_ns: u64) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.busy_time_ns.fetch_add(duration_ns, Ordering::Relaxed);
        let _ = self.lateness_histogram.write().record(lateness_ns);
    }

    /// Record a caught panic
    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tasks_canceled(&self, count: u64) {
        self.tasks_canceled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_tasks_discarded(&self, count: u64) {
        self.tasks_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.lateness_histogram.read();

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            tasks_scheduled: self.tasks_scheduled.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_canceled: self.tasks_canceled.load(Ordering::Relaxed),
            tasks_discarded: self.tasks_discarded.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            avg_lateness_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_lateness_ns: histogram.value_at_quantile(0.50),
            p99_lateness_ns: histogram.value_at_quantile(0.99),
            max_lateness_ns: histogram.max(),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub tasks_scheduled: u64,
    pub tasks_executed: u64,
    pub tasks_canceled: u64,
    pub tasks_discarded: u64,
    pub tasks_panicked: u64,
    pub busy_time_ns: u64,
    pub avg_lateness_ns: u64,
    pub p50_lateness_ns: u64,
    pub p99_lateness_ns: u64,
    pub max_lateness_ns: u64,
}

impl MetricsSnapshot {
    /// Fraction of uptime the worker spent inside actions (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        let uptime_ns = self.uptime.as_nanos() as f64;
        if uptime_ns == 0.0 {
            return 0.0;
        }
        (self.busy_time_ns as f64 / uptime_ns).min(1.0)
    }

    /// Tasks still queued or running, as far as the counters can tell.
    pub fn outstanding(&self) -> u64 {
        self.tasks_scheduled.saturating_sub(
            self.tasks_executed + self.tasks_canceled + self.tasks_discarded,
        )
    }
}

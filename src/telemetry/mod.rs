//! Telemetry for the delayed executor.
//!
//! Counts scheduled, executed, canceled and discarded tasks and records how
//! late each task started relative to its deadline.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub mod export;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

#[cfg(feature = "telemetry")]
pub use export::{JsonExporter, MetricsExporter};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use crate::error::Result;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Result<Self> {
            Ok(Self)
        }
        pub fn record_task_scheduled(&self) {}
        pub fn record_task_execution(&self, _: u64, _: u64) {}
        pub fn record_task_panic(&self) {}
        pub fn record_tasks_canceled(&self, _: u64) {}
        pub fn record_tasks_discarded(&self, _: u64) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }

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
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};

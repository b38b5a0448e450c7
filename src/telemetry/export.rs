//! Metrics export.

use super::metrics::MetricsSnapshot;
use crate::error::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Trait for exporting metrics to different sinks
pub trait MetricsExporter: Send + Sync {
    /// Export a metrics snapshot
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()>;
}

/// Export metrics to a JSON file
#[derive(Debug)]
pub struct JsonExporter {
    output_path: PathBuf,
}

impl JsonExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }
}

impl MetricsExporter for JsonExporter {
    fn export(&self, snapshot: &MetricsSnapshot) -> Result<()> {
        let json = to_json(snapshot)?;
        std::fs::write(&self.output_path, json)?;
        Ok(())
    }
}

/// Render a snapshot as pretty-printed JSON.
pub fn to_json(snapshot: &MetricsSnapshot) -> Result<String> {
    let serializable = SerializableSnapshot::from(snapshot);
    serde_json::to_string_pretty(&serializable)
        .map_err(|e| Error::telemetry(format!("JSON serialization failed: {}", e)))
}

#[derive(Debug, Clone, Serialize)]
struct SerializableSnapshot {
    uptime_secs: f64,
    tasks_scheduled: u64,
    tasks_executed: u64,
    tasks_canceled: u64,
    tasks_discarded: u64,
    tasks_panicked: u64,
    busy_time_ms: u64,
    avg_lateness_us: f64,
    p50_lateness_us: f64,
    p99_lateness_us: f64,
    max_lateness_us: f64,
    utilization: f64,
}

impl From<&MetricsSnapshot> for SerializableSnapshot {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self {
            uptime_secs: snapshot.uptime.as_secs_f64(),
            tasks_scheduled: snapshot.tasks_scheduled,
            tasks_executed: snapshot.tasks_executed,
            tasks_canceled: snapshot.tasks_canceled,
            tasks_discarded: snapshot.tasks_discarded,
            tasks_panicked: snapshot.tasks_panicked,
            busy_time_ms: snapshot.busy_time_ns / 1_000_000,
            avg_lateness_us: snapshot.avg_lateness_ns as f64 / 1_000.0,
            p50_lateness_us: snapshot.p50_lateness_ns as f64 / 1_000.0,
            p99_lateness_us: snapshot.p99_lateness_ns as f64 / 1_000.0,
            max_lateness_us: snapshot.max_lateness_ns as f64 / 1_000.0,
            utilization: snapshot.utilization(),
        }
    }
}

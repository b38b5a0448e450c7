pub use crate::config::{Config, ConfigBuilder, ShutdownPolicy};
pub use crate::error::{Error, Result};
pub use crate::executor::{DelayedExecutor, PanicStrategy, TaskId};

pub use crate::telemetry::MetricsSnapshot;

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{JsonExporter, MetricsExporter};

//! Delayed task execution on a single worker thread.
//!
//! A [`DelayedExecutor`] owns one background thread and a deadline-ordered
//! queue. Callers on any thread schedule zero-argument callables to run after
//! a delay, optionally with a cancellation callable that runs instead if
//! [`DelayedExecutor::cancel_all`] removes the task first.
//!
//! # Quick Start
//!
//! ```no_run
//! use delayed_worker::prelude::*;
//! use std::time::Duration;
//!
//! let executor = DelayedExecutor::new()?;
//!
//! executor.schedule(|| println!("later"), Duration::from_millis(50))?;
//! executor.schedule_with_cancel(
//!     || println!("sooner"),
//!     || println!("never mind"),
//!     Duration::from_millis(10),
//! )?;
//!
//! std::thread::sleep(Duration::from_millis(100));
//! # Ok::<(), delayed_worker::Error>(())
//! ```
//!
//! # Guarantees
//!
//! - A task never runs before its deadline.
//! - Tasks run one at a time, earliest deadline first; equal deadlines run in
//!   scheduling order.
//! - Every task runs exactly one of its action or its cancellation callback,
//!   except tasks still queued at shutdown under [`ShutdownPolicy::Discard`],
//!   which run neither.
//! - A newly scheduled task with an earlier deadline wakes the worker early.
//!
//! # Features
//!
//! - **telemetry** (default): task counters and a lateness histogram, with
//!   JSON export.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
mod scheduler;
pub mod telemetry;

pub use config::{Config, ConfigBuilder, ShutdownPolicy};
pub use error::{Error, Result};
pub use executor::{DelayedExecutor, PanicStrategy, TaskId};

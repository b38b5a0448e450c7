//! Task execution infrastructure.
//!
//! This module provides the delayed executor, its worker loop, the task
//! record it schedules, and the panic handling applied to task callables.

pub mod delayed;
pub mod panic_handler;
pub mod task;
pub(crate) mod worker;

pub use delayed::DelayedExecutor;
pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use task::{Callback, TaskId};

pub(crate) use task::Task;

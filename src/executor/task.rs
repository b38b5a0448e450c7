//! Task representation and execution.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Boxed zero-argument callable owned by a task.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A deadline, the action to run at it, and an optional callable to run
/// instead if the task is canceled first.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) when: Instant,
    action: Callback,
    on_canceled: Option<Callback>,
}

impl Task {
    pub fn new(when: Instant, action: Callback, on_canceled: Option<Callback>) -> Self {
        Task {
            id: TaskId::next(),
            when,
            action,
            on_canceled,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.when <= now
    }

    pub fn has_cancel_callback(&self) -> bool {
        self.on_canceled.is_some()
    }

    /// Consume the task, running its action.
    pub fn run(self) {
        (self.action)();
    }

    /// Split off the cancellation callback, dropping the action unrun.
    pub fn into_cancel_callback(self) -> Option<Callback> {
        self.on_canceled
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("when", &self.when)
            .field("has_cancel_callback", &self.on_canceled.is_some())
            .finish()
    }
}

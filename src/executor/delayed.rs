use super::panic_handler::{PanicHandler, PanicInfo};
use super::task::{Callback, Task, TaskId};
use super::worker::{self, Shared};
use crate::config::{Config, ShutdownPolicy};
use crate::error::{Error, Result};
use crate::scheduler::DeadlineQueue;
use crate::telemetry::metrics::{Metrics, MetricsSnapshot};
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Runs callables on one background thread once their delay has elapsed.
///
/// Any number of threads may schedule concurrently (wrap the executor in an
/// `Arc` to share it). Tasks run one at a time in deadline order, never before
/// their deadline, and never while the internal lock is held, so an action may
/// itself schedule follow-up work.
///
/// ```no_run
/// use delayed_worker::DelayedExecutor;
/// use std::time::Duration;
///
/// let executor = DelayedExecutor::new()?;
/// executor.schedule_with_cancel(
///     || println!("tuned"),
///     || println!("tune canceled"),
///     Duration::from_millis(30),
/// )?;
/// executor.cancel_all();
/// # Ok::<(), delayed_worker::Error>(())
/// ```
#[derive(Debug)]
pub struct DelayedExecutor {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    shutdown_policy: ShutdownPolicy,
    thread_name: String,
}

impl DelayedExecutor {
    /// Start an executor with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Start an executor. Fails if the config is invalid or the worker
    /// thread cannot be spawned; no tasks can be scheduled in either case.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new(
            DeadlineQueue::with_capacity_limit(config.max_pending),
            PanicHandler::new(config.panic_strategy),
            Metrics::new()?,
        ));

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let worker_shared = shared.clone();
        let worker = builder
            .spawn(move || worker::run(worker_shared))
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

        debug!(
            "started executor '{}' (panic strategy {:?}, shutdown policy {:?})",
            config.thread_name,
            shared.panic_handler.strategy(),
            config.shutdown_policy
        );

        Ok(Self {
            shared,
            worker: Some(worker),
            shutdown_policy: config.shutdown_policy,
            thread_name: config.thread_name,
        })
    }

    /// Run `action` once `delay` has elapsed.
    pub fn schedule<F>(&self, action: F, delay: Duration) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(deadline_after(delay)?, Box::new(action), None)
    }

    /// Run `action` once `delay` has elapsed, or `on_canceled` instead if
    /// [`cancel_all`](Self::cancel_all) removes the task first.
    pub fn schedule_with_cancel<F, C>(
        &self,
        action: F,
        on_canceled: C,
        delay: Duration,
    ) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.enqueue(
            deadline_after(delay)?,
            Box::new(action),
            Some(Box::new(on_canceled)),
        )
    }

    /// Run `action` at `deadline`. A deadline in the past runs as soon as possible.
    pub fn schedule_at<F>(&self, action: F, deadline: Instant) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(deadline, Box::new(action), None)
    }

    pub fn schedule_at_with_cancel<F, C>(
        &self,
        action: F,
        on_canceled: C,
        deadline: Instant,
    ) -> Result<TaskId>
    where
        F: FnOnce() + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.enqueue(deadline, Box::new(action), Some(Box::new(on_canceled)))
    }

    fn enqueue(
        &self,
        when: Instant,
        action: Callback,
        on_canceled: Option<Callback>,
    ) -> Result<TaskId> {
        let task = Task::new(when, action, on_canceled);
        let tid = task.id;
        let cancelable = task.has_cancel_callback();

        let earliest = {
            let mut state = self.shared.state.lock();
            if state.worker_panicked {
                return Err(Error::WorkerPanic(
                    "worker thread terminated by a panicking task".to_string(),
                ));
            }
            if state.terminating {
                return Err(Error::ShutDown);
            }
            state.pending.push(task)?;
            state.pending.peek_id() == Some(tid)
        };

        // only a new head moves the worker's wake-up time
        if earliest {
            self.shared.cond.notify_one();
        }

        self.shared.metrics.record_task_scheduled();
        trace!(
            "scheduled task {} in {:?} (cancelable: {})",
            tid,
            when.saturating_duration_since(Instant::now()),
            cancelable
        );

        Ok(tid)
    }

    /// Remove every pending task, running the cancellation callbacks of those
    /// that have one before returning. Callbacks run on the calling thread,
    /// earliest deadline first, without the lock held. A task already running
    /// on the worker is unaffected. Under [`PanicStrategy::Propagate`] a
    /// panicking callback unwinds into the caller and the remaining removed
    /// tasks are dropped unrun.
    ///
    /// Returns the number of tasks removed.
    ///
    /// [`PanicStrategy::Propagate`]: super::PanicStrategy::Propagate
    pub fn cancel_all(&self) -> usize {
        let canceled = self.shared.state.lock().pending.take_all();
        let removed = canceled.len();

        let invoked = self.run_cancel_callbacks(canceled);

        self.shared.metrics.record_tasks_canceled(removed as u64);
        debug!(
            "canceled {} pending tasks ({} cancellation callbacks run)",
            removed, invoked
        );

        removed
    }

    fn run_cancel_callbacks(&self, tasks: DeadlineQueue) -> usize {
        let mut invoked = 0;
        for task in tasks {
            if let Some(on_canceled) = task.into_cancel_callback() {
                if self.shared.panic_handler.execute(on_canceled).is_err() {
                    self.shared.metrics.record_task_panic();
                }
                invoked += 1;
            }
        }
        invoked
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().pending.is_empty()
    }

    /// Deadline of the next task to run, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.shared.state.lock().pending.next_deadline()
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Panics raised by callables, including one that took the worker down.
    pub fn panic_count(&self) -> usize {
        self.shared.panic_handler.panic_count()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Stop the worker and settle pending tasks according to the configured
    /// [`ShutdownPolicy`]. Idempotent; later calls to `schedule*` fail with
    /// [`Error::ShutDown`]. If a panicking task already took the worker down,
    /// `schedule*` fails with [`Error::WorkerPanic`] and the tasks left
    /// queued are settled here like any others.
    ///
    /// Waits for a task that is currently running to finish. Called from the
    /// worker thread itself, the join is skipped and the worker exits after the
    /// current task returns.
    pub fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };

        self.shared.state.lock().terminating = true;
        self.shared.cond.notify_all();

        let joined = if handle.thread().id() == thread::current().id() {
            warn!(
                "executor '{}' shut down from its own worker thread, not joining",
                self.thread_name
            );
            Ok(())
        } else {
            handle.join().map_err(|payload| {
                let info = PanicInfo::from_payload(payload.as_ref());
                error!("worker '{}' panicked: {}", self.thread_name, info.message);
                Error::WorkerPanic(info.message)
            })
        };

        let leftover = self.shared.state.lock().pending.take_all();
        let count = leftover.len();
        match self.shutdown_policy {
            ShutdownPolicy::Discard => {
                self.shared.metrics.record_tasks_discarded(count as u64);
                drop(leftover);
                debug!(
                    "executor '{}' stopped, {} pending tasks discarded",
                    self.thread_name, count
                );
            }
            ShutdownPolicy::CancelPending => {
                let invoked = self.run_cancel_callbacks(leftover);
                self.shared.metrics.record_tasks_canceled(count as u64);
                debug!(
                    "executor '{}' stopped, {} pending tasks canceled ({} callbacks run)",
                    self.thread_name, count, invoked
                );
            }
        }

        joined
    }
}

impl Drop for DelayedExecutor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("executor '{}' shutdown failed: {}", self.thread_name, e);
        }
    }
}

fn deadline_after(delay: Duration) -> Result<Instant> {
    Instant::now().checked_add(delay).ok_or_else(|| {
        Error::invalid_argument(format!("delay {:?} overflows the monotonic clock", delay))
    })
}

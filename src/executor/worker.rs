// the single consumer thread
use super::panic_handler::PanicHandler;
use super::task::Task;
use crate::scheduler::DeadlineQueue;
use crate::telemetry::metrics::Metrics;
use log::{debug, error, trace};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// State guarded by the executor's single mutex.
#[derive(Debug)]
pub(crate) struct State {
    pub pending: DeadlineQueue,
    /// Set once at shutdown, never cleared.
    pub terminating: bool,
    /// Set when a panicking callable unwound the worker thread.
    pub worker_panicked: bool,
}

/// Everything the worker and the callers share.
#[derive(Debug)]
pub(crate) struct Shared {
    pub state: Mutex<State>,
    pub cond: Condvar,
    pub panic_handler: PanicHandler,
    pub metrics: Metrics,
}

impl Shared {
    pub fn new(pending: DeadlineQueue, panic_handler: PanicHandler, metrics: Metrics) -> Self {
        Self {
            state: Mutex::new(State {
                pending,
                terminating: false,
                worker_panicked: false,
            }),
            cond: Condvar::new(),
            panic_handler,
            metrics,
        }
    }
}

/// Marks the executor dead if the worker thread unwinds, so nothing more
/// is accepted for a thread that will never run it.
struct UnwindGuard<'a>(&'a Shared);

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut state = self.0.state.lock();
            state.terminating = true;
            state.worker_panicked = true;
            error!(
                "delayed worker unwinding, {} pending tasks left for shutdown",
                state.pending.len()
            );
        }
    }
}

// main loop
pub(crate) fn run(shared: Arc<Shared>) {
    debug!("delayed worker started");
    let _guard = UnwindGuard(&shared);

    loop {
        let task = {
            let mut state = shared.state.lock();
            if state.terminating {
                break;
            }

            let now = Instant::now();
            match state.pending.next_deadline() {
                None => {
                    shared.cond.wait(&mut state);
                    continue;
                }
                Some(when) if when > now => {
                    // an earlier task or shutdown cuts this short
                    shared.cond.wait_until(&mut state, when);
                    continue;
                }
                Some(_) => {}
            }

            match state.pending.pop_due(now) {
                Some(task) => task,
                None => continue,
            }
        };

        // lock released: the action may schedule more work
        execute_task(&shared, task);
    }

    debug!("delayed worker stopped");
}

fn execute_task(shared: &Shared, task: Task) {
    let tid = task.id;
    let start = Instant::now();
    let lateness_ns = start.saturating_duration_since(task.when).as_nanos() as u64;
    trace!("running task {} ({}ns past deadline)", tid, lateness_ns);

    let result = shared.panic_handler.execute(|| task.run());

    let duration_ns = start.elapsed().as_nanos() as u64;
    shared.metrics.record_task_execution(lateness_ns, duration_ns);
    if result.is_err() {
        shared.metrics.record_task_panic();
    }
}

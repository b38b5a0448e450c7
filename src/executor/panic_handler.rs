use log::{error, warn};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the worker treats a callable that panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// No safety net: the panic unwinds and takes the worker thread down.
    #[default]
    Propagate,
    /// Catch the panic, count it, keep going.
    Isolate,
    /// Like `Isolate`, but also log the panic message.
    LogAndContinue,
    /// Log and abort the process.
    Abort,
}

#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    /// Run `f` under this handler's strategy.
    ///
    /// Returns `Err` only for strategies that swallow the panic; under
    /// `Propagate` the panic resumes unwinding after being counted.
    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(panic_payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);

                match self.strategy {
                    PanicStrategy::Propagate => resume_unwind(panic_payload),
                    PanicStrategy::Abort => {
                        let panic_info = PanicInfo::from_payload(panic_payload.as_ref());
                        error!("task panicked (abort strategy): {}", panic_info.message);
                        std::process::abort();
                    }
                    PanicStrategy::Isolate => Err(PanicInfo::from_payload(panic_payload.as_ref())),
                    PanicStrategy::LogAndContinue => {
                        let panic_info = PanicInfo::from_payload(panic_payload.as_ref());
                        warn!("task panicked: {}", panic_info.message);
                        Err(panic_info)
                    }
                }
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn strategy(&self) -> PanicStrategy {
        self.strategy
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        Self { message }
    }
}

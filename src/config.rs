use crate::error::{Error, Result};
use crate::executor::PanicStrategy;

/// What happens to tasks still queued when the executor shuts down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Drop pending tasks without running either callable.
    #[default]
    Discard,
    /// Run each pending task's cancellation callback, earliest deadline first.
    CancelPending,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub thread_name: String,
    pub stack_size: Option<usize>,
    pub max_pending: Option<usize>,
    pub panic_strategy: PanicStrategy,
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thread_name: "delayed-worker".to_string(),
            stack_size: None,
            max_pending: None,
            panic_strategy: PanicStrategy::default(),
            shutdown_policy: ShutdownPolicy::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_name.is_empty() {
            return Err(Error::config("thread_name must not be empty"));
        }
        if self.thread_name.contains('\0') {
            return Err(Error::config("thread_name must not contain NUL bytes"));
        }
        if self.max_pending == Some(0) {
            return Err(Error::config("max_pending must be > 0"));
        }
        if self.stack_size == Some(0) {
            return Err(Error::config("stack_size must be > 0"));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn max_pending(mut self, limit: usize) -> Self {
        self.config.max_pending = Some(limit);
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.config.shutdown_policy = policy;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

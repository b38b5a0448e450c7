pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of memory: task queue could not grow")]
    OutOfMemory,

    #[error("task queue full ({capacity} pending)")]
    QueueFull { capacity: usize },

    #[error("executor has been shut down")]
    ShutDown,

    #[error("executor error: {0}")]
    Executor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn telemetry<S: Into<String>>(msg: S) -> Self {
        Error::Telemetry(msg.into())
    }

    /// True for the resource-exhaustion class of failures.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, Error::OutOfMemory | Error::QueueFull { .. })
    }
}

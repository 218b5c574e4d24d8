//! Scheduler error types.

use thiserror::Error;

/// Configuration and programming errors.
///
/// Task failures never show up here; they travel through the task's own
/// [`TaskHandle`](crate::TaskHandle) untouched.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid concurrency limit {0}: must be a positive integer")]
    InvalidLimit(usize),

    #[error("no tokio runtime available to drive scheduled tasks")]
    NoRuntime,

    #[error("{0}")]
    Invariant(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Error produced by [`timeout`](crate::control::timeout) when the wrapped
/// operation has not settled in time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError {
    #[error("operation didn't settle within expected time of {ms} ms")]
    Elapsed { ms: u64 },
}

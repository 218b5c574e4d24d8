use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Environment key read by [`SchedulerOptions::from_env`].
pub const LIMIT_ENV: &str = "TASKQ_LIMIT";

/// Per-scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerOptions {
    /// Maximum number of non-immediate tasks running at once.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize { 1 }

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

impl SchedulerOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Reject a zero `limit`.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.limit == 0 {
            return Err(SchedulerError::InvalidLimit(self.limit));
        }
        Ok(())
    }

    /// Parse and validate options from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, SchedulerError> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load and validate options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Build options from the environment (a `.env` file is honored if present).
    ///
    /// A missing `TASKQ_LIMIT` means the default limit; an unparsable one is
    /// a configuration error.
    pub fn from_env() -> Result<Self, SchedulerError> {
        dotenvy::dotenv().ok();
        let options = match std::env::var(LIMIT_ENV).ok().filter(|s| !s.is_empty()) {
            Some(raw) => {
                let limit = raw.trim().parse::<usize>().map_err(|e| {
                    SchedulerError::Config(format!("{LIMIT_ENV}={raw:?}: {e}"))
                })?;
                Self { limit }
            }
            None => Self::default(),
        };
        options.validate()?;
        Ok(options)
    }

    /// Apply overrides on top of these options, then validate the result.
    pub fn merged(mut self, limit: Option<usize>) -> Result<Self, SchedulerError> {
        if let Some(limit) = limit {
            self.limit = limit;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Opaque caller data forwarded to a task through its [`RunContext`](super::RunContext).
///
/// The scheduler never looks inside.
#[derive(Clone)]
pub struct Context(Arc<dyn Any + Send + Sync>);

impl Context {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Context(..)")
    }
}

/// Per-submission options.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Skip the queue and the concurrency limit entirely.
    pub immediate: bool,
    /// Higher runs sooner. Equal priorities run in submission order.
    pub priority: i64,
    /// Caller data handed to the task untouched.
    pub context: Option<Context>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn context<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.context = Some(Context::new(value));
        self
    }
}

//! Bounded-concurrency priority scheduler.
//!
//! The [`Scheduler`] admits queued tasks into a fixed pool of worker slots,
//! highest priority first and FIFO among equals. Immediate tasks skip the
//! queue. Every task receives a [`RunContext`] describing the scheduler's
//! state at the moment it started.

pub mod context;
pub mod metrics;
pub mod runner;
mod task;
pub mod types;

pub use context::RunContext;
pub use metrics::{SchedulerStats, WorkerStatus};
pub use runner::Scheduler;
pub use task::TaskHandle;
pub use types::{Context, SchedulerOptions, TaskOptions, LIMIT_ENV};

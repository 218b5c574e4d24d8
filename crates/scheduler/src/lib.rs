//! In-process task orchestration: a bounded-concurrency priority scheduler
//! plus the small async helpers that go with it.

pub mod control;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod settle;

pub use control::{
    delay, delayed_reject, delayed_resolve, invariant, parallel_limit, sequence, series, timeout,
};
pub use error::{SchedulerError, TimeoutError};
pub use queue::{Prioritized, StablePriorityQueue};
pub use scheduler::{
    Context, RunContext, Scheduler, SchedulerOptions, SchedulerStats, TaskHandle, TaskOptions,
    WorkerStatus,
};
pub use settle::{after, state, Settlement, SettlementKind};

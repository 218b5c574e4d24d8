use std::any::Any;

use super::types::{SchedulerOptions, TaskOptions};

/// Snapshot handed to a task when it starts running.
///
/// All counters are taken at the instant the task is admitted and do not
/// change afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run-order sequence number, starting at 0. Immediate and queued tasks
    /// draw from the same counter.
    pub index: u64,
    /// Worker slot occupied by this task, `0..limit`. `None` for immediate
    /// tasks, which are expected to use their own resources.
    pub worker_nr: Option<usize>,
    /// Tasks running right now (queued and immediate), this one included.
    pub pending: usize,
    /// Tasks still sitting in the queue.
    pub waiting: usize,
    /// Non-immediate tasks settled successfully so far.
    pub fulfilled: u64,
    /// Non-immediate tasks settled with a failure so far.
    pub rejected: u64,
    pub options: TaskOptions,
    pub scheduler_options: SchedulerOptions,
}

impl RunContext {
    pub fn is_immediate(&self) -> bool {
        self.worker_nr.is_none()
    }

    /// Typed view of the caller data submitted with this task.
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.options.context.as_ref().and_then(|c| c.downcast_ref::<T>())
    }
}

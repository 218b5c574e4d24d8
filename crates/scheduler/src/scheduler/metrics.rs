use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one worker slot is doing.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    /// Run index of the occupying task.
    pub index: u64,
    pub priority: i64,
    pub started_at: DateTime<Utc>,
}

/// Point-in-time view of the scheduler's counters.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStats {
    pub limit: usize,
    /// Running tasks, queued and immediate.
    pub pending: usize,
    /// Tasks sitting in the queue.
    pub waiting: usize,
    pub running_immediate: usize,
    pub fulfilled: u64,
    pub rejected: u64,
    /// Index the next task to start will receive.
    pub next_index: u64,
    /// One entry per worker slot, `None` when the slot is free.
    pub workers: Vec<Option<WorkerStatus>>,
}

impl SchedulerStats {
    /// Occupied worker slots.
    pub fn busy_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_some()).count()
    }

    /// Fraction of worker slots in use (0.0 - 1.0).
    pub fn worker_utilization(&self) -> f64 {
        if self.workers.is_empty() {
            return 0.0;
        }
        self.busy_workers() as f64 / self.workers.len() as f64
    }

    /// Non-immediate tasks that have settled either way.
    pub fn settled(&self) -> u64 {
        self.fulfilled + self.rejected
    }
}

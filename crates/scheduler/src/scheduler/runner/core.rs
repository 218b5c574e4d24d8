use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tracing::info;

use crate::error::SchedulerError;
use crate::queue::StablePriorityQueue;
use crate::scheduler::context::RunContext;
use crate::scheduler::metrics::{SchedulerStats, WorkerStatus};
use crate::scheduler::task::QueueEntry;
use crate::scheduler::types::{SchedulerOptions, TaskOptions};

/// The task currently holding a worker slot.
pub(super) struct WorkerSlot {
    pub(super) context: RunContext,
    pub(super) started_at: DateTime<Utc>,
}

/// Everything the admission and settlement paths mutate. Guarded by one lock.
pub(super) struct Inner {
    pub(super) queue: StablePriorityQueue<QueueEntry>,
    /// Length is always `limit`.
    pub(super) slots: Vec<Option<WorkerSlot>>,
    /// Occupied slots; equals the number of `Some` entries in `slots`.
    pub(super) running: usize,
    pub(super) running_immediate: usize,
    pub(super) next_index: u64,
    pub(super) fulfilled: u64,
    pub(super) rejected: u64,
}

impl Inner {
    fn new(limit: usize) -> Self {
        Self {
            queue: StablePriorityQueue::new(),
            slots: (0..limit).map(|_| None).collect(),
            running: 0,
            running_immediate: 0,
            next_index: 0,
            fulfilled: 0,
            rejected: 0,
        }
    }

    pub(super) fn pending(&self) -> usize {
        self.running + self.running_immediate
    }

    /// Lowest free slot index, if any.
    pub(super) fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Claim a run index and build the context for a task that starts now.
    ///
    /// The caller has already counted the task as running.
    pub(super) fn context_for(
        &mut self,
        worker_nr: Option<usize>,
        options: TaskOptions,
        scheduler_options: SchedulerOptions,
    ) -> RunContext {
        let index = self.next_index;
        self.next_index += 1;
        RunContext {
            index,
            worker_nr,
            pending: self.pending(),
            waiting: self.queue.len(),
            fulfilled: self.fulfilled,
            rejected: self.rejected,
            options,
            scheduler_options,
        }
    }

    fn stats(&self, limit: usize) -> SchedulerStats {
        SchedulerStats {
            limit,
            pending: self.pending(),
            waiting: self.queue.len(),
            running_immediate: self.running_immediate,
            fulfilled: self.fulfilled,
            rejected: self.rejected,
            next_index: self.next_index,
            workers: self
                .slots
                .iter()
                .map(|slot| {
                    slot.as_ref().map(|s| WorkerStatus {
                        index: s.context.index,
                        priority: s.context.options.priority,
                        started_at: s.started_at,
                    })
                })
                .collect(),
        }
    }
}

pub(super) struct Shared {
    pub(super) options: SchedulerOptions,
    pub(super) runtime: Handle,
    pub(super) inner: Mutex<Inner>,
}

/// Bounded-concurrency priority scheduler.
///
/// At most `limit` non-immediate tasks run at once; the rest wait in a
/// [`StablePriorityQueue`]. Immediate tasks skip the queue and the limit.
/// Every task runs as its own tokio task and receives a [`RunContext`].
///
/// Cloning is cheap and every clone submits to the same queue, so a task
/// can capture a clone and schedule more work while it runs.
///
/// # Example
/// ```
/// # use taskq_scheduler::{Scheduler, SchedulerOptions};
/// # #[tokio::main]
/// # async fn main() {
/// let scheduler = Scheduler::new(SchedulerOptions::with_limit(2)).unwrap();
/// let handles: Vec<_> = (0..4u32)
///     .map(|n| scheduler.schedule(move |_ctx| async move { Ok::<_, String>(n * 2) }))
///     .collect();
/// let results = futures::future::try_join_all(handles).await.unwrap();
/// assert_eq!(results, vec![0, 2, 4, 6]);
/// # }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    pub(super) shared: Arc<Shared>,
}

impl Scheduler {
    /// Create a scheduler driven by the tokio runtime of the calling context.
    pub fn new(options: SchedulerOptions) -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Self::with_handle(options, runtime)
    }

    /// Create a scheduler that spawns its tasks on `runtime`.
    pub fn with_handle(options: SchedulerOptions, runtime: Handle) -> Result<Self, SchedulerError> {
        options.validate()?;
        info!(limit = options.limit, "scheduler created");
        Ok(Self {
            shared: Arc::new(Shared {
                options,
                runtime,
                inner: Mutex::new(Inner::new(options.limit)),
            }),
        })
    }

    pub fn options(&self) -> SchedulerOptions {
        self.shared.options
    }

    /// Snapshot of the current counters and worker slots.
    pub fn stats(&self) -> SchedulerStats {
        self.lock().stats(self.shared.options.limit)
    }

    /// Number of tasks waiting in the queue.
    pub fn waiting(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of tasks currently running, queued and immediate.
    pub fn pending(&self) -> usize {
        self.lock().pending()
    }

    /// No task is running and none is waiting.
    pub fn is_idle(&self) -> bool {
        let inner = self.lock();
        inner.pending() == 0 && inner.queue.is_empty()
    }

    // Bookkeeping never panics while holding the lock, so a poisoned
    // mutex still carries consistent state.
    pub(super) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Scheduler")
            .field("limit", &self.shared.options.limit)
            .field("pending", &inner.pending())
            .field("waiting", &inner.queue.len())
            .field("fulfilled", &inner.fulfilled)
            .field("rejected", &inner.rejected)
            .finish()
    }
}

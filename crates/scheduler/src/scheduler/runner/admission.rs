use std::future::Future;

use chrono::Utc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::scheduler::context::RunContext;
use crate::scheduler::task::{job, Job, QueueEntry, SettleHook, TaskHandle};
use crate::scheduler::types::TaskOptions;
use crate::settle::SettlementKind;

use super::core::WorkerSlot;
use super::Scheduler;

impl Scheduler {
    /// Submit a task with default [`TaskOptions`].
    pub fn schedule<F, Fut, T, E>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce(RunContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.schedule_with(task, TaskOptions::default())
    }

    /// Submit a task.
    ///
    /// Immediate tasks start right away. Everything else is queued by
    /// priority and admitted as soon as a worker slot is free. Returns
    /// without waiting for the task in either case; the handle resolves to
    /// exactly what the task returned.
    pub fn schedule_with<F, Fut, T, E>(&self, task: F, options: TaskOptions) -> TaskHandle<T, E>
    where
        F: FnOnce(RunContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = job(task, tx);

        if options.immediate {
            let ctx = {
                let mut inner = self.lock();
                inner.running_immediate += 1;
                inner.context_for(None, options, self.shared.options)
            };
            debug!(index = ctx.index, pending = ctx.pending, "starting immediate task");
            self.launch(job, ctx);
        } else {
            let waiting = {
                let mut inner = self.lock();
                inner.queue.push(QueueEntry { job, options });
                inner.queue.len()
            };
            debug!(waiting, "task queued");
            self.admit();
        }

        TaskHandle::new(rx)
    }

    /// Move queued tasks into free worker slots until either runs out.
    pub(super) fn admit(&self) {
        loop {
            let (job, ctx) = {
                let mut inner = self.lock();
                let Some(worker) = inner.free_slot() else {
                    return;
                };
                let Some(entry) = inner.queue.pop() else {
                    return;
                };

                inner.running += 1;
                let ctx = inner.context_for(Some(worker), entry.options, self.shared.options);
                inner.slots[worker] = Some(WorkerSlot {
                    context: ctx.clone(),
                    started_at: Utc::now(),
                });
                (entry.job, ctx)
            };

            debug!(
                index = ctx.index,
                worker = ?ctx.worker_nr,
                priority = ctx.options.priority,
                pending = ctx.pending,
                waiting = ctx.waiting,
                "admitting task"
            );
            self.launch(job, ctx);
        }
    }

    fn launch(&self, job: Job, ctx: RunContext) {
        let scheduler = self.clone();
        let index = ctx.index;
        let worker = ctx.worker_nr;
        let on_settle: SettleHook = Box::new(move |kind| scheduler.settle(index, worker, kind));
        self.shared.runtime.spawn(job(ctx, on_settle));
    }

    /// Release the task's slot, update counters, and admit more work.
    fn settle(&self, index: u64, worker: Option<usize>, kind: SettlementKind) {
        let Some(worker) = worker else {
            self.lock().running_immediate -= 1;
            debug!(index, outcome = ?kind, "immediate task settled");
            return;
        };

        let (released, fulfilled, rejected) = {
            let mut inner = self.lock();
            let released = inner.slots.get_mut(worker).and_then(Option::take);
            inner.running -= 1;
            match kind {
                SettlementKind::Fulfilled => inner.fulfilled += 1,
                SettlementKind::Rejected => inner.rejected += 1,
            }
            (released, inner.fulfilled, inner.rejected)
        };

        assert!(
            released.is_some_and(|slot| slot.context.index == index),
            "worker slot {worker} did not hold task {index}"
        );

        if kind == SettlementKind::Rejected {
            warn!(index, worker, "task rejected");
        }
        debug!(index, worker, outcome = ?kind, fulfilled, rejected, "task settled");

        self.admit();
    }
}

//! Synthetic workload: submit tasks, collect what each one observed.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use taskq_scheduler::{
    delay, timeout, RunContext, Scheduler, SchedulerStats, TaskOptions, TimeoutError,
};

use crate::cli::CliArgs;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {0} failed on purpose")]
    Induced(u64),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// One task as seen from inside its [`RunContext`].
#[derive(Debug, Serialize)]
pub struct TaskRecord {
    pub task: u64,
    pub index: u64,
    pub worker: Option<usize>,
    pub priority: i64,
    pub immediate: bool,
    pub pending: usize,
    pub waiting: usize,
    pub started_ms: u128,
    pub duration_ms: u64,
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub limit: usize,
    pub submitted: u64,
    pub elapsed_ms: u128,
    pub tasks: Vec<TaskRecord>,
    pub stats: SchedulerStats,
}

/// What a task records about itself before doing any work.
struct Observed {
    ctx: RunContext,
    started_ms: u128,
}

/// A failed task still carries what it observed.
struct Failed {
    observed: Observed,
    error: TaskError,
}

pub async fn run(scheduler: &Scheduler, args: &CliArgs) -> Report {
    let begin = Instant::now();
    info!(tasks = args.tasks, limit = scheduler.options().limit, "submitting workload");

    let mut handles = Vec::with_capacity(args.tasks as usize);
    for task in 0..args.tasks {
        let duration_ms = args.duration_for(task);
        let fail = args.should_fail(task);
        let timeout_ms = args.timeout_ms;

        let mut options = TaskOptions::new().priority(args.priority_for(task)).context(task);
        if args.is_immediate(task) {
            options = options.immediate();
        }

        let handle = scheduler.schedule_with(
            move |ctx: RunContext| async move {
                let observed = Observed {
                    started_ms: begin.elapsed().as_millis(),
                    ctx,
                };
                let work = async {
                    delay(duration_ms).await;
                    if fail {
                        Err(TaskError::Induced(task))
                    } else {
                        Ok(())
                    }
                };
                let result = if timeout_ms > 0 {
                    timeout(work, timeout_ms).await.map_err(TaskError::from).and_then(|r| r)
                } else {
                    work.await
                };
                match result {
                    Ok(()) => Ok(observed),
                    Err(error) => Err(Failed { observed, error }),
                }
            },
            options,
        );
        handles.push((task, duration_ms, handle));
    }

    let mut tasks = Vec::with_capacity(handles.len());
    for (task, duration_ms, handle) in handles {
        let (observed, outcome) = match handle.await {
            Ok(observed) => (observed, "fulfilled".to_string()),
            Err(Failed { observed, error }) => (observed, format!("rejected: {error}")),
        };
        debug!(task, index = observed.ctx.index, %outcome, "task finished");

        let ctx = observed.ctx;
        tasks.push(TaskRecord {
            task: ctx.context::<u64>().copied().unwrap_or(task),
            index: ctx.index,
            worker: ctx.worker_nr,
            priority: ctx.options.priority,
            immediate: ctx.is_immediate(),
            pending: ctx.pending,
            waiting: ctx.waiting,
            started_ms: observed.started_ms,
            duration_ms,
            outcome,
        });
    }

    tasks.sort_by_key(|record| record.index);
    Report {
        limit: scheduler.options().limit,
        submitted: args.tasks,
        elapsed_ms: begin.elapsed().as_millis(),
        tasks,
        stats: scheduler.stats(),
    }
}

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context as PollContext, Poll};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::oneshot;

use crate::queue::Prioritized;
use crate::settle::{after, SettlementKind};

use super::context::RunContext;
use super::types::TaskOptions;

/// How a task failed: its own error, or a panic in its body.
pub(crate) enum Failure<E> {
    Error(E),
    Panic(Box<dyn Any + Send + 'static>),
}

type Outcome<T, E> = Result<T, Failure<E>>;

/// Bookkeeping callback run once the task settles.
pub(crate) type SettleHook = Box<dyn FnOnce(SettlementKind) + Send + 'static>;

/// Type-erased task plus the channel its result goes back through.
pub(crate) type Job = Box<dyn FnOnce(RunContext, SettleHook) -> BoxFuture<'static, ()> + Send + 'static>;

pub(crate) fn job<F, Fut, T, E>(task: F, reply: oneshot::Sender<Outcome<T, E>>) -> Job
where
    F: FnOnce(RunContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(move |ctx: RunContext, on_settle: SettleHook| {
        async move {
            // Calling `task` inside the async block puts a panic in the
            // closure itself on the same path as a panic after an await.
            let run = AssertUnwindSafe(async move { task(ctx).await })
                .catch_unwind()
                .map(|caught| match caught {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(Failure::Error(err)),
                    Err(payload) => Err(Failure::Panic(payload)),
                });

            let outcome = after(run, move |kind| async move {
                on_settle(kind);
                Ok(())
            })
            .await;

            // The caller may have dropped its handle; the task still counted.
            let _ = reply.send(outcome);
        }
        .boxed()
    })
}

/// A task waiting in the queue.
pub(crate) struct QueueEntry {
    pub(crate) job: Job,
    pub(crate) options: TaskOptions,
}

impl Prioritized for QueueEntry {
    fn priority(&self) -> i64 {
        self.options.priority
    }
}

/// Resolves to the scheduled task's own result.
///
/// Dropping the handle does not cancel the task.
///
/// # Panics
///
/// Polling panics if the task itself panicked (the original payload is
/// resumed), or if the runtime dropped the task before it settled.
#[must_use = "a TaskHandle does nothing unless awaited; dropping it does not cancel the task"]
pub struct TaskHandle<T, E> {
    rx: oneshot::Receiver<Outcome<T, E>>,
}

impl<T, E> TaskHandle<T, E> {
    pub(crate) fn new(rx: oneshot::Receiver<Outcome<T, E>>) -> Self {
        Self { rx }
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut PollContext<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(Failure::Error(err)))) => Poll::Ready(Err(err)),
            Poll::Ready(Ok(Err(Failure::Panic(payload)))) => panic::resume_unwind(payload),
            Poll::Ready(Err(_)) => panic!("scheduled task was dropped before it settled"),
        }
    }
}

impl<T, E> std::fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

//! Thin async helpers built around the scheduler's task shape.
//!
//! None of these hold state; they compose tokio timers and the
//! [`Scheduler`] into the common control-flow patterns.

use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;

use crate::error::{SchedulerError, TimeoutError};
use crate::scheduler::{RunContext, Scheduler, SchedulerOptions};

/// Wait `ms` milliseconds.
pub async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Wait `ms` milliseconds, then succeed with `value`.
pub async fn delayed_resolve<T, E>(value: T, ms: u64) -> Result<T, E> {
    delay(ms).await;
    Ok(value)
}

/// Wait `ms` milliseconds, then fail with `reason`.
pub async fn delayed_reject<T, E>(reason: E, ms: u64) -> Result<T, E> {
    delay(ms).await;
    Err(reason)
}

/// Fail with [`TimeoutError::Elapsed`] unless `operation` settles within `ms`.
///
/// The wrapped operation is dropped on timeout.
pub async fn timeout<F: Future>(operation: F, ms: u64) -> Result<F::Output, TimeoutError> {
    tokio::time::timeout(Duration::from_millis(ms), operation)
        .await
        .map_err(|_| TimeoutError::Elapsed { ms })
}

/// Run `tasks` one after another, stopping at the first failure.
///
/// # Example
/// ```
/// # use taskq_scheduler::{delay, sequence};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let steps = "abc".chars().map(|c| move || async move {
///     delay(5).await;
///     println!("{c}");
///     Ok::<_, String>(())
/// });
/// sequence(steps).await.unwrap();
/// # }
/// ```
pub async fn sequence<I, F, Fut, E>(tasks: I) -> Result<(), E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for task in tasks {
        task().await?;
    }
    Ok(())
}

/// Run `tasks` with at most `limit` in flight, collecting results in
/// submission order. Fails with the first task error observed in that order.
pub async fn parallel_limit<I, F, Fut, T, E>(tasks: I, limit: usize) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce(RunContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<SchedulerError> + Send + 'static,
{
    let scheduler = Scheduler::new(SchedulerOptions::with_limit(limit))?;
    let handles: Vec<_> = tasks.into_iter().map(|task| scheduler.schedule(task)).collect();
    try_join_all(handles).await
}

/// Run `tasks` one at a time in submission order, collecting every result.
///
/// Unlike [`sequence`], a failure doesn't stop later tasks from running.
pub async fn series<I, F, Fut, T, E>(tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce(RunContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<SchedulerError> + Send + 'static,
{
    parallel_limit(tasks, 1).await
}

/// Precondition check: `Err(SchedulerError::Invariant)` when `condition` is false.
pub fn invariant(condition: bool, message: impl Into<String>) -> Result<(), SchedulerError> {
    if condition {
        Ok(())
    } else {
        Err(SchedulerError::Invariant(format!(
            "Invariant violation: {}",
            message.into()
        )))
    }
}

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::{FutureExt, Shared};

use super::Settlement;

/// Report whether `operation` is pending, fulfilled or rejected.
///
/// Works on a clone of the [`Shared`] handle, so every other holder still
/// receives the original outcome. The runtime gets one turn to make
/// progress before the clone is polled; if it still isn't ready,
/// [`Settlement::Pending`] is returned instead of waiting.
///
/// An operation that panics is reported as [`Settlement::Panicked`]; the
/// panic is caught here rather than unwinding into the caller. Other holders
/// of the same [`Shared`] still panic when they poll it.
pub async fn state<F, T, E>(operation: &Shared<F>) -> Settlement<T, E>
where
    F: Future<Output = Result<T, E>>,
    T: Clone,
    E: Clone,
{
    if let Some(outcome) = operation.peek() {
        return outcome.clone().into();
    }

    let observer = operation.clone();
    tokio::task::yield_now().await;

    match AssertUnwindSafe(observer).catch_unwind().now_or_never() {
        Some(Ok(outcome)) => outcome.into(),
        Some(Err(_)) => Settlement::Panicked,
        None => Settlement::Pending,
    }
}

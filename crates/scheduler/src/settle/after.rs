use std::future::Future;

use super::SettlementKind;

/// Await `operation`, then run `hook` exactly once with the way it settled.
///
/// The original outcome is returned unchanged unless the hook itself fails,
/// in which case the hook's error wins.
///
/// # Example
/// ```
/// # use taskq_scheduler::settle::{after, SettlementKind};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result = after(async { Err::<u32, &str>("boom") }, |kind| async move {
///     assert_eq!(kind, SettlementKind::Rejected);
///     Ok(())
/// })
/// .await;
/// assert_eq!(result, Err("boom"));
/// # }
/// ```
pub async fn after<Op, T, E, H, HookFut>(operation: Op, hook: H) -> Result<T, E>
where
    Op: Future<Output = Result<T, E>>,
    H: FnOnce(SettlementKind) -> HookFut,
    HookFut: Future<Output = Result<(), E>>,
{
    let outcome = operation.await;
    hook(SettlementKind::of(&outcome)).await?;
    outcome
}

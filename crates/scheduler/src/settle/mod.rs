//! Observing how asynchronous operations settle.
//!
//! - [`state`] peeks at a shared operation without consuming its result.
//! - [`after`] runs a follow-up once an operation settles, like a `finally`
//!   block that can see which way the operation went.

mod after;
mod state;

pub use after::after;
pub use state::state;

/// Which way a settled operation went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementKind {
    Fulfilled,
    Rejected,
}

impl SettlementKind {
    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => SettlementKind::Fulfilled,
            Err(_) => SettlementKind::Rejected,
        }
    }
}

/// Observed state of an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T, E> {
    /// Not settled yet.
    Pending,
    /// Settled successfully with this value.
    Fulfilled(T),
    /// Settled with this failure reason.
    Rejected(E),
    /// Panicked instead of returning. Counts as a rejection, but there is no
    /// reason value to carry.
    Panicked,
}

impl<T, E> Settlement<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_) | Settlement::Panicked)
    }

    /// `None` while pending.
    pub fn kind(&self) -> Option<SettlementKind> {
        match self {
            Settlement::Pending => None,
            Settlement::Fulfilled(_) => Some(SettlementKind::Fulfilled),
            Settlement::Rejected(_) | Settlement::Panicked => Some(SettlementKind::Rejected),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settlement<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settlement::Fulfilled(value),
            Err(reason) => Settlement::Rejected(reason),
        }
    }
}

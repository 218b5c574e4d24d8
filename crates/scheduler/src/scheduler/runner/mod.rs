//! Bounded-concurrency scheduler runner.
//!
//! Split into focused submodules:
//! - `core`: Scheduler handle, shared state, constructor and accessors
//! - `admission`: submission, queue admission into worker slots, settlement

mod admission;
mod core;

pub use self::core::Scheduler;

//! # Policies
//!
//! - [`FaultPolicy`] handling of panicking signal subscribers.
//! - [`FailurePolicy`] whether the supervisor stops after a failed task.

mod failure;
mod fault;

pub use failure::FailurePolicy;
pub use fault::FaultPolicy;

//! # Subscriber fault policy.
//!
//! [`FaultPolicy`] decides what the [`Dispatcher`](crate::Dispatcher) does when a
//! subscriber callback panics on the controlling thread.
//!
//! ```text
//! FaultPolicy::Log        → tracing::error!, continue with the next job (default)
//! FaultPolicy::Propagate  → return SubscriberFault to the caller draining the queue;
//!                           jobs still queued stay queued
//! ```
//!
//! In both cases the panic is isolated to the single faulty invocation.

/// What to do with a panic raised inside a subscriber callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Log the fault and keep dispatching.
    #[default]
    Log,
    /// Hand the fault back to whoever drains the dispatcher.
    Propagate,
}

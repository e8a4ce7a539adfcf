//! # Signals delivered on the controlling thread.
//!
//! - [`Dispatcher`] - the controlling thread's job queue (receiver side)
//! - [`DispatchHandle`] - sender side, usable from any thread
//! - [`Signal`] - multi-subscriber channel that routes callbacks through a dispatcher
//! - [`Subscription`] - scoped registration guard

mod dispatcher;
mod signal;

pub use dispatcher::{DispatchHandle, Dispatcher};
pub use signal::{OwnerId, Signal, SlotId, Subscription};

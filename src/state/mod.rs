//! # Shared state between worker threads and the controlling thread.
//!
//! - [`SharedState`] - independently locked cells, optionally signalling on change
//! - [`Var`] - typed key naming one cell

mod shared;
mod var;

pub use shared::SharedState;
pub use var::Var;

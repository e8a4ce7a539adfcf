//! # Ready-made subscribers for task signals.
//!
//! Subscribers are plain callbacks connected to a [`Signal`](crate::Signal);
//! this module collects the ones shipped with the crate.
//!
//! ```text
//! TaskHandle ── progress / error / running ──► Signal ──► Dispatcher (controlling thread)
//!                                                              │
//!                                                  ┌───────────┼───────────┐
//!                                                  ▼           ▼           ▼
//!                                              LogWriter   task hooks    custom
//! ```

mod log;

pub use log::LogWriter;

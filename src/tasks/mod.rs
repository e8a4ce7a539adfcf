//! # Task abstractions and the task state machine.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for implementing blocking, cancelable tasks with controlling-thread hooks
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskHandle`] - worker thread + lifecycle around one task
//! - [`TaskContext`] - what the body sees: progress reporting and cancellation

mod context;
mod handle;
mod state;
mod task;
mod task_fn;

pub use context::TaskContext;
pub use handle::TaskHandle;
pub use state::{Progress, TaskOutcome, TaskState};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;

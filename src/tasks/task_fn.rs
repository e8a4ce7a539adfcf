//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(&TaskContext) -> Result<(), TaskError>`.
//! Every run calls the same closure again; if runs need to share state, keep it
//! in an `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use taskboss::{TaskFn, TaskRef, TaskContext, TaskError};
//!
//! let t: TaskRef = TaskFn::new("worker", |ctx: &TaskContext| {
//!     ctx.report_progress(1, "working");
//!     Ok::<_, TaskError>(())
//! })
//! .with_steps(1)
//! .into_ref();
//!
//! assert_eq!(t.name(), "worker");
//! assert_eq!(t.progress_steps_count(), 1);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::TaskError;

use super::{Task, TaskContext, TaskRef};

/// Function-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    steps: AtomicU32,
    cancelable: bool,
    f: F,
}

impl<F> TaskFn<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync + 'static,
{
    /// Creates a new function-backed task with zero progress steps.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            description: Cow::Borrowed(""),
            steps: AtomicU32::new(0),
            cancelable: true,
            f,
        }
    }

    /// Creates the task and returns it as a shared `Arc<TaskFn>`.
    ///
    /// Keep the concrete `Arc` when the step count must be adjusted later with
    /// [`TaskFn::set_progress_steps`].
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the number of progress steps.
    pub fn with_steps(self, steps: u32) -> Self {
        self.steps.store(steps, Ordering::Relaxed);
        self
    }

    /// Reports the task as not cancelable.
    ///
    /// The flag only tells callers not to offer cancellation;
    /// [`TaskHandle::cancel`](crate::TaskHandle::cancel) still works.
    pub fn non_cancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }

    /// Wraps the task into a [`TaskRef`].
    pub fn into_ref(self) -> TaskRef {
        Arc::new(self)
    }

    /// Adjusts the number of progress steps.
    ///
    /// Only meaningful before the task is started; a running task reports the
    /// count frozen at `run()`.
    pub fn set_progress_steps(&self, steps: u32) {
        self.steps.store(steps, Ordering::Relaxed);
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn progress_steps_count(&self) -> u32 {
        self.steps.load(Ordering::Relaxed)
    }

    fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    fn run_task(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx)
    }
}

impl<F> fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn")
            .field("name", &self.name)
            .field("steps", &self.steps.load(Ordering::Relaxed))
            .field("cancelable", &self.cancelable)
            .finish()
    }
}

//! # Task abstraction.
//!
//! The [`Task`] trait carries the business logic of one unit of work plus the
//! hooks invoked on the controlling thread. The runtime wraps a task in a
//! [`TaskHandle`](crate::TaskHandle), which owns the worker thread and the
//! lifecycle state.
//!
//! The body receives a [`TaskContext`] and should regularly poll
//! [`TaskContext::is_cancelled`] to honour cooperative cancellation.

use std::sync::Arc;

use crate::error::TaskError;

use super::{Progress, TaskContext};

/// # Blocking, cancelable unit of work.
///
/// [`run_task`](Task::run_task) runs on a dedicated worker thread. The hooks
/// run on the controlling thread, in the order their signals were emitted, and
/// must not block.
///
/// # Example
/// ```
/// use taskboss::{Task, TaskContext, TaskError};
///
/// struct Copy { files: Vec<String> }
///
/// impl Task for Copy {
///     fn name(&self) -> &str { "copy" }
///
///     fn progress_steps_count(&self) -> u32 { self.files.len() as u32 }
///
///     fn run_task(&self, ctx: &TaskContext) -> Result<(), TaskError> {
///         for (i, file) in self.files.iter().enumerate() {
///             ctx.check_cancelled()?;
///             ctx.report_progress(i as u32 + 1, format!("copying {file}"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Short description of the task.
    fn description(&self) -> &str {
        ""
    }

    /// Total number of progress steps.
    ///
    /// Read right before the task starts; the value may change until then and
    /// is frozen for the duration of the run.
    fn progress_steps_count(&self) -> u32 {
        0
    }

    /// Whether callers may offer cancellation for this task.
    fn is_cancelable(&self) -> bool {
        true
    }

    /// Executes the task on the worker thread.
    ///
    /// Errors and panics are caught at the worker boundary and published on
    /// the task's error signal. Returning [`TaskError::Canceled`] ends the run
    /// as cancelled instead of failed.
    fn run_task(&self, ctx: &TaskContext) -> Result<(), TaskError>;

    /// Called on the controlling thread for every progress report.
    fn progress_changed(&self, _progress: &Progress) {}

    /// Called on the controlling thread when the body failed.
    fn error_raised(&self, _error: &str) {}

    /// Called on the controlling thread when the running flag flips.
    fn is_running_changed(&self, _running: bool) {}
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

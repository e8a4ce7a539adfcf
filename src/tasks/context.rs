use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::state::{SharedState, Var};

use super::Progress;

pub(crate) const PROGRESS: Var<Progress> = Var::new("progress");
pub(crate) const ERROR: Var<String> = Var::new("error");

/// What a task body sees of its run: progress reporting and the cancellation flag.
///
/// Progress goes through the run's [`SharedState`]; each report is stored and
/// then forwarded to the controlling thread.
pub struct TaskContext {
    name: Arc<str>,
    token: CancellationToken,
    vars: Arc<SharedState>,
}

impl TaskContext {
    pub(crate) fn new(name: Arc<str>, token: CancellationToken, vars: Arc<SharedState>) -> Self {
        Self { name, token, vars }
    }

    /// Name of the running task.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes a progress snapshot.
    pub fn report_progress(&self, step: u32, message: impl Into<String>) {
        self.vars.store(PROGRESS, Progress::new(step, message));
    }

    /// True once the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns `Err(TaskError::Canceled)` once the run was cancelled, for use with `?`.
    pub fn check_cancelled(&self) -> Result<(), TaskError> {
        if self.token.is_cancelled() {
            Err(TaskError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Cancellation token of this run, e.g. to hand to async code.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn vars(&self) -> &SharedState {
        &self.vars
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

use crate::tasks::{TaskHandle, TaskOutcome};

/// Result of one supervised task, consumed before the next task starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskReport {
    /// Task name.
    pub name: String,
    /// How the run ended.
    pub outcome: TaskOutcome,
    /// Step count the run was started with.
    pub steps: u32,
}

impl TaskReport {
    /// True if the task succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }

    /// Failure message, if the task failed.
    pub fn error(&self) -> Option<&str> {
        self.outcome.error()
    }

    /// Builds the report of a handle that left the running state.
    pub(crate) fn from_handle(handle: &TaskHandle) -> Self {
        Self {
            name: handle.name().to_string(),
            outcome: handle.outcome().unwrap_or(TaskOutcome::Cancelled),
            steps: handle.progress_steps_count(),
        }
    }
}

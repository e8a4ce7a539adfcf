use std::fmt;

/// Lifecycle state of a [`TaskHandle`](crate::TaskHandle).
///
/// ```text
/// Idle ──run()──► Running ──┬──► Succeeded
///   ▲                       ├──► Failed
///   │                       └──► Cancelled
///   └───────── run() again from any terminal state
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Never started.
    #[default]
    Idle,
    /// A worker thread executes the task body.
    Running,
    /// The body returned `Ok(())`.
    Succeeded,
    /// The body returned an error or panicked.
    Failed,
    /// `cancel()` was called, or the body stopped with `TaskError::Canceled`.
    Cancelled,
}

impl TaskState {
    /// True for `Succeeded`, `Failed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Progress snapshot reported by a task body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    /// Current step, out of the task's `progress_steps_count`.
    pub step: u32,
    /// Short description of what happens in this step.
    pub message: String,
}

impl Progress {
    /// Creates a snapshot.
    pub fn new(step: u32, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

/// How a finished task ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The body completed successfully.
    Succeeded,
    /// The body failed with `error`.
    Failed {
        /// Failure message, as published on the error signal.
        error: String,
    },
    /// The run was cancelled.
    Cancelled,
}

impl TaskOutcome {
    /// State a task ends up in with this outcome.
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Succeeded => TaskState::Succeeded,
            TaskOutcome::Failed { .. } => TaskState::Failed,
            TaskOutcome::Cancelled => TaskState::Cancelled,
        }
    }

    /// True for [`TaskOutcome::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }

    /// Failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            TaskOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

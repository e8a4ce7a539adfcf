//! # Failure policy for supervised task sequences.
//!
//! [`FailurePolicy`] decides whether the [`Supervisor`](crate::Supervisor) keeps
//! going after a task fails.
//!
//! ```text
//! FailurePolicy::Continue → run the next task regardless (default)
//! FailurePolicy::Abort    → stop the sequence after the first failed task
//! ```

use crate::tasks::TaskOutcome;

/// Policy applied by the supervisor after each task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Run the remaining tasks no matter what happened before.
    #[default]
    Continue,
    /// Stop after the first task that ended in [`TaskOutcome::Failed`].
    Abort,
}

impl FailurePolicy {
    /// True if the sequence should stop after a task ended with `outcome`.
    pub fn should_stop(&self, outcome: &TaskOutcome) -> bool {
        matches!(
            (self, outcome),
            (FailurePolicy::Abort, TaskOutcome::Failed { .. })
        )
    }
}

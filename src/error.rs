//! Error types used by the taskboss runtime and tasks.
//!
//! This module defines the error enums of the crate:
//!
//! - [`RuntimeError`]: errors raised synchronously by the runtime itself
//!   (starting a task, supervising a sequence of tasks).
//! - [`TaskError`]: errors returned by task bodies. They never cross the worker
//!   boundary as errors: the worker turns them into error-signal payloads.
//! - [`StateError`]: misuse of a [`SharedState`](crate::SharedState).
//! - [`SubscriberFault`]: a panic raised inside a signal subscriber.
//!
//! The enums provide `as_label` helpers for logs and metrics.

use std::any::Any;
use std::io;

use thiserror::Error;

use crate::signals::SlotId;

/// # Errors produced by the taskboss runtime.
///
/// Reported synchronously to the caller of [`TaskHandle::run`](crate::TaskHandle::run)
/// or [`Supervisor::run_tasks`](crate::Supervisor::run_tasks).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `run()` was called on a task that is already running.
    #[error("task {task:?} is already running")]
    AlreadyRunning {
        /// Name of the task.
        task: String,
    },

    /// The task was cancelled but its previous worker thread has not exited yet.
    #[error("task {task:?} still has an active worker from a cancelled run")]
    WorkerBusy {
        /// Name of the task.
        task: String,
    },

    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn worker thread for task {task:?}: {source}")]
    Spawn {
        /// Name of the task.
        task: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A subscriber panicked and the dispatcher runs with [`FaultPolicy::Propagate`](crate::FaultPolicy::Propagate).
    #[error(transparent)]
    Subscriber(#[from] SubscriberFault),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskboss::RuntimeError;
    ///
    /// let err = RuntimeError::AlreadyRunning { task: "copy".into() };
    /// assert_eq!(err.as_label(), "runtime_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning { .. } => "runtime_already_running",
            RuntimeError::WorkerBusy { .. } => "runtime_worker_busy",
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::Subscriber(_) => "runtime_subscriber_fault",
        }
    }
}

/// # Errors produced by task execution.
///
/// Returned from [`Task::run_task`](crate::Task::run_task).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task body failed; the message is published on the error signal.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The body observed cancellation and stopped early (graceful exit).
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}

impl From<io::Error> for TaskError {
    fn from(err: io::Error) -> Self {
        TaskError::fail(err.to_string())
    }
}

impl From<String> for TaskError {
    fn from(error: String) -> Self {
        TaskError::Fail { error }
    }
}

impl From<&str> for TaskError {
    fn from(error: &str) -> Self {
        TaskError::fail(error)
    }
}

/// # Errors produced by [`SharedState`](crate::SharedState).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The variable was never registered, or was registered with another value type.
    #[error("invalid shared variable {name:?}")]
    InvalidVariable {
        /// Variable name.
        name: String,
    },

    /// The variable name is already taken.
    #[error("shared variable {name:?} is already registered")]
    AlreadyRegistered {
        /// Variable name.
        name: String,
    },
}

impl StateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::InvalidVariable { .. } => "state_invalid_variable",
            StateError::AlreadyRegistered { .. } => "state_already_registered",
        }
    }
}

/// A subscriber callback panicked on the controlling thread.
///
/// The fault is isolated to that single invocation: other subscribers and later
/// emissions keep running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("subscriber {slot} of signal {signal:?} panicked: {message}")]
pub struct SubscriberFault {
    /// Name of the signal the subscriber was connected to.
    pub signal: String,
    /// Slot of the faulty subscriber.
    pub slot: SlotId,
    /// Panic message.
    pub message: String,
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
        assert_eq!(panic_message(c.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_task_error_display_is_bare_message() {
        assert_eq!(TaskError::fail("disk full").to_string(), "disk full");
        assert_eq!(TaskError::from("oops").as_label(), "task_failed");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }
}

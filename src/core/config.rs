//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the dispatcher, task handles and
//! the supervisor.
//!
//! Config is used in three places:
//! 1. **Dispatcher creation**: `Dispatcher::new(&config)`
//! 2. **Task handles**: `TaskHandle::with_config(task, dispatch, &config)`
//! 3. **Supervisor creation**: `Supervisor::builder(config)`
//!
//! ## Sentinel values
//! - `worker_stack_size = 0` → platform default stack size
//! - `thread_name_prefix = ""` → worker threads are named after the task only

use crate::policies::{FailurePolicy, FaultPolicy};

/// Global configuration for the taskboss runtime.
///
/// ## Field semantics
/// - `fault_policy`: what the dispatcher does with panicking subscribers
/// - `failure_policy`: whether the supervisor stops after a failed task
/// - `worker_stack_size`: stack size of worker threads in bytes (`0` = default)
/// - `thread_name_prefix`: prefix of worker thread names
/// - `log_tasks`: attach a [`LogWriter`](crate::LogWriter) to every collected task
#[derive(Clone, Debug)]
pub struct Config {
    /// Handling of subscriber panics on the controlling thread.
    pub fault_policy: FaultPolicy,

    /// Behaviour of the supervisor after a failed task.
    pub failure_policy: FailurePolicy,

    /// Worker thread stack size in bytes.
    ///
    /// - `0` = platform default
    /// - `n > 0` = explicit size
    pub worker_stack_size: usize,

    /// Prefix of worker thread names (`"<prefix>-<task name>"`).
    pub thread_name_prefix: String,

    /// Log task progress, errors and running changes through `tracing`.
    pub log_tasks: bool,
}

impl Config {
    /// Returns the worker stack size as an `Option`.
    ///
    /// - `None` → platform default
    /// - `Some(n)` → explicit size
    #[inline]
    pub fn stack_size(&self) -> Option<usize> {
        match self.worker_stack_size {
            0 => None,
            n => Some(n),
        }
    }

    /// Name of the worker thread running `task`.
    pub fn thread_name(&self, task: &str) -> String {
        if self.thread_name_prefix.is_empty() {
            task.to_string()
        } else {
            format!("{}-{}", self.thread_name_prefix, task)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `fault_policy = FaultPolicy::Log`
    /// - `failure_policy = FailurePolicy::Continue`
    /// - `worker_stack_size = 0` (platform default)
    /// - `thread_name_prefix = "taskboss"`
    /// - `log_tasks = false`
    fn default() -> Self {
        Self {
            fault_policy: FaultPolicy::default(),
            failure_policy: FailurePolicy::default(),
            worker_stack_size: 0,
            thread_name_prefix: "taskboss".to_string(),
            log_tasks: false,
        }
    }
}

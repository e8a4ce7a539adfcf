//! # Task sources.
//!
//! A [`TaskSource`] is anything that exposes an ordered list of tasks to the
//! supervisor. [`TaskModule`] is the basic implementation: a named list.

use crate::tasks::TaskHandle;

/// Provider of tasks for the [`Supervisor`](crate::Supervisor).
///
/// The supervisor asks every source for its tasks and keeps their order.
/// Handles are shared: the source may keep its own clones to observe the tasks.
pub trait TaskSource: Send + Sync + 'static {
    /// Source name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Tasks exposed by this source, in execution order.
    fn tasks(&self) -> Vec<TaskHandle>;
}

/// Named list of tasks.
#[derive(Debug, Default, Clone)]
pub struct TaskModule {
    name: String,
    tasks: Vec<TaskHandle>,
}

impl TaskModule {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Adds a task and returns the module (builder style).
    pub fn with_task(mut self, task: TaskHandle) -> Self {
        self.tasks.push(task);
        self
    }

    /// Appends a task.
    pub fn add_task(&mut self, task: TaskHandle) {
        self.tasks.push(task);
    }
}

impl TaskSource for TaskModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn tasks(&self) -> Vec<TaskHandle> {
        self.tasks.clone()
    }
}

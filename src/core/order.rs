//! # Task ordering strategies.
//!
//! The supervisor sorts the collected tasks with a [`TaskOrder`] before running
//! them. [`IdentityOrder`] (the default) keeps the collection order and makes no
//! other promise. [`OrderBy`] applies a stable comparator.
//!
//! ```
//! use taskboss::{OrderBy, TaskHandle};
//!
//! // Shortest tasks first; ties keep collection order.
//! let order = OrderBy::new(|a: &TaskHandle, b: &TaskHandle| {
//!     a.progress_steps_count().cmp(&b.progress_steps_count())
//! });
//! # let _ = order;
//! ```

use std::cmp::Ordering;

use crate::tasks::TaskHandle;

/// Strategy that orders collected tasks in place.
pub trait TaskOrder: Send + Sync + 'static {
    /// Reorders `tasks`. Must accept empty and single-element slices.
    fn sort(&self, tasks: &mut [TaskHandle]);
}

/// Keeps the collection order.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityOrder;

impl TaskOrder for IdentityOrder {
    fn sort(&self, _tasks: &mut [TaskHandle]) {}
}

/// Stable sort by a comparator.
pub struct OrderBy<F> {
    cmp: F,
}

impl<F> OrderBy<F>
where
    F: Fn(&TaskHandle, &TaskHandle) -> Ordering + Send + Sync + 'static,
{
    /// Creates the strategy from `cmp`.
    pub fn new(cmp: F) -> Self {
        Self { cmp }
    }
}

impl<F> TaskOrder for OrderBy<F>
where
    F: Fn(&TaskHandle, &TaskHandle) -> Ordering + Send + Sync + 'static,
{
    fn sort(&self, tasks: &mut [TaskHandle]) {
        tasks.sort_by(|a, b| (self.cmp)(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Dispatcher;
    use crate::tasks::{TaskContext, TaskFn, TaskRef};

    fn handle(d: &Dispatcher, name: &'static str, steps: u32) -> TaskHandle {
        let task: TaskRef = TaskFn::new(name, |_ctx: &TaskContext| Ok(()))
            .with_steps(steps)
            .into_ref();
        TaskHandle::new(task, d.handle())
    }

    fn names(tasks: &[TaskHandle]) -> Vec<&str> {
        tasks.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_identity_keeps_order_and_handles_small_inputs() {
        let d = Dispatcher::default();
        let mut empty: Vec<TaskHandle> = Vec::new();
        IdentityOrder.sort(&mut empty);
        assert!(empty.is_empty());

        let mut one = vec![handle(&d, "only", 1)];
        IdentityOrder.sort(&mut one);
        assert_eq!(names(&one), vec!["only"]);

        let mut many = vec![handle(&d, "b", 2), handle(&d, "a", 1)];
        IdentityOrder.sort(&mut many);
        assert_eq!(names(&many), vec!["b", "a"]);
    }

    #[test]
    fn test_order_by_is_stable() {
        let d = Dispatcher::default();
        let mut tasks = vec![
            handle(&d, "long", 9),
            handle(&d, "short-1", 1),
            handle(&d, "mid", 5),
            handle(&d, "short-2", 1),
        ];
        let order = OrderBy::new(|a: &TaskHandle, b: &TaskHandle| {
            a.progress_steps_count().cmp(&b.progress_steps_count())
        });
        order.sort(&mut tasks);
        assert_eq!(names(&tasks), vec!["short-1", "short-2", "mid", "long"]);
    }
}

use std::sync::Arc;

use super::order::{IdentityOrder, TaskOrder};
use super::source::TaskSource;
use super::supervisor::Supervisor;
use crate::core::Config;
use crate::signals::Dispatcher;

/// Builder for constructing a [`Supervisor`] with sources and an ordering strategy.
pub struct SupervisorBuilder {
    cfg: Config,
    sources: Vec<Arc<dyn TaskSource>>,
    order: Box<dyn TaskOrder>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            sources: Vec::new(),
            order: Box::new(IdentityOrder),
        }
    }

    /// Replaces the task sources.
    pub fn with_sources(mut self, sources: Vec<Arc<dyn TaskSource>>) -> Self {
        self.sources = sources;
        self
    }

    /// Appends one task source.
    pub fn with_source(mut self, source: impl TaskSource) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Sets the ordering strategy applied before every run.
    ///
    /// Defaults to [`IdentityOrder`].
    pub fn with_order(mut self, order: impl TaskOrder) -> Self {
        self.order = Box::new(order);
        self
    }

    /// Builds the supervisor.
    ///
    /// The `task_completed` signal of the supervisor is delivered through `dispatcher`.
    pub fn build(self, dispatcher: &Dispatcher) -> Arc<Supervisor> {
        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.sources,
            self.order,
            dispatcher.handle(),
        ))
    }
}

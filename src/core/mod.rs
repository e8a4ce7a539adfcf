//! Runtime core: configuration and sequential orchestration.
//!
//! The main entry point is [`Supervisor`], which collects tasks from
//! [`TaskSource`]s and runs them one after another.
//!
//! Internal modules:
//! - [`config`]: global runtime settings;
//! - [`source`]: task providers and the basic [`TaskModule`];
//! - [`order`]: ordering strategies applied before a run;
//! - [`report`]: per-task result emitted on completion;
//! - [`supervisor`]: sequential runner;
//! - [`builder`]: supervisor construction.

mod builder;
mod config;
mod order;
mod report;
mod source;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use order::{IdentityOrder, OrderBy, TaskOrder};
pub use report::TaskReport;
pub use source::{TaskModule, TaskSource};
pub use supervisor::Supervisor;

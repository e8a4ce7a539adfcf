//! # taskboss
//!
//! **Taskboss** runs blocking tasks on worker threads and reports their progress,
//! errors and completion back to one controlling thread.
//!
//! Worker threads never call user callbacks directly: every notification goes
//! through a [`Signal`] and is queued on the [`Dispatcher`] owned by the
//! controlling thread, which runs the callbacks in emission order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskSource  │   │  TaskSource  │   │  TaskSource  │
//!     │ (TaskModule) │   │ (TaskModule) │   │   (custom)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (sequential runner)                                   │
//! │  - collect_tasks() / sort_tasks() (TaskOrder)                     │
//! │  - one TaskHandle running at a time                               │
//! │  - task_completed: Signal<TaskReport>                             │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!     ┌──────────────┐  worker thread   ┌──────────────┐
//!     │  TaskHandle  │ ───────────────► │ Task::run_   │
//!     │ (lifecycle)  │                  │  task(ctx)   │
//!     └──────┬───────┘                  └──────┬───────┘
//!            │ running(bool)                   │ report_progress() / Err / panic
//!            ▼                                 ▼
//!     ┌──────────────────────────────────────────────────┐
//!     │ Signal<T>::emit ─► one job per connected slot    │
//!     └─────────────────────────┬────────────────────────┘
//!                               ▼
//!            ┌────────────────────────────────────────┐
//!            │ Dispatcher (controlling thread, !Send) │
//!            │  dispatch_pending / run_until          │
//!            └───┬──────────────┬──────────────┬──────┘
//!                ▼              ▼              ▼
//!           task hooks      LogWriter     user callbacks
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──run()──► Running ──┬─ Ok(())           ─► Succeeded
//!                           ├─ Err(e) / panic   ─► Failed     (error signal)
//!                           ├─ Err(Canceled)    ─► Cancelled
//!                           └─ cancel()         ─► Cancelled  (immediately; worker stops when it polls)
//!
//! Succeeded / Failed / Cancelled ──run()──► Running   (fresh shared state)
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                         |
//! |-------------------|------------------------------------------------------------------|--------------------------------------------|
//! | **Signals**       | Thread-safe notification with delivery on the controlling thread | [`Signal`], [`Dispatcher`], [`Subscription`] |
//! | **Shared state**  | Typed cells with independent locks and change signals            | [`SharedState`], [`Var`]                   |
//! | **Tasks**         | Blocking, cancelable units of work with lifecycle tracking       | [`Task`], [`TaskFn`], [`TaskHandle`]       |
//! | **Supervision**   | Sequential runs over ordered task collections                    | [`Supervisor`], [`TaskSource`], [`TaskOrder`] |
//! | **Policies**      | Subscriber faults and failure handling                           | [`FaultPolicy`], [`FailurePolicy`]         |
//! | **Errors**        | Typed errors for the runtime and task bodies                     | [`RuntimeError`], [`TaskError`]            |
//! | **Configuration** | Centralize runtime settings                                      | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use taskboss::{Config, Dispatcher, Supervisor, TaskContext, TaskError, TaskFn, TaskHandle, TaskModule};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let mut dispatcher = Dispatcher::new(&cfg);
//!
//!     let count = TaskFn::new("count", |ctx: &TaskContext| {
//!         for step in 1..=3 {
//!             ctx.check_cancelled()?;
//!             ctx.report_progress(step, format!("step {step}"));
//!         }
//!         Ok(())
//!     })
//!     .with_steps(3);
//!     let broken = TaskFn::new("broken", |_ctx: &TaskContext| Err(TaskError::fail("no input")));
//!
//!     let count = TaskHandle::with_config(count.into_ref(), dispatcher.handle(), &cfg);
//!     count.connect_progress(|p| println!("count: {}/3 {}", p.step, p.message));
//!
//!     let module = TaskModule::new("demo")
//!         .with_task(count)
//!         .with_task(TaskHandle::with_config(broken.into_ref(), dispatcher.handle(), &cfg));
//!
//!     let sup = Supervisor::builder(cfg).with_source(module).build(&dispatcher);
//!     let reports = sup.run_tasks(&mut dispatcher).await?;
//!
//!     assert!(reports[0].succeeded());
//!     assert_eq!(reports[1].error(), Some("no input"));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod policies;
mod signals;
mod state;
mod subscribers;
mod sync;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    Config, IdentityOrder, OrderBy, Supervisor, SupervisorBuilder, TaskModule, TaskOrder,
    TaskReport, TaskSource,
};
pub use error::{RuntimeError, StateError, SubscriberFault, TaskError};
pub use policies::{FailurePolicy, FaultPolicy};
pub use signals::{DispatchHandle, Dispatcher, OwnerId, Signal, SlotId, Subscription};
pub use state::{SharedState, Var};
pub use subscribers::LogWriter;
pub use tasks::{Progress, Task, TaskContext, TaskFn, TaskHandle, TaskOutcome, TaskRef, TaskState};

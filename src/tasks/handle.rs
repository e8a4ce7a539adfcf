//! # TaskHandle: the state machine around one task.
//!
//! A [`TaskHandle`] runs a [`Task`] on its own worker thread and reports back to
//! the controlling thread through three signals.
//!
//! ## Event flow
//! ```text
//! run() ──► [lock] state=Running, fresh SharedState + token ──► spawn worker ──► emit running(true)
//!
//! worker thread:
//!   task.run_task(ctx)
//!     ├─ ctx.report_progress() ─► SharedState.store(progress) ─► progress signal
//!     ├─ Ok(())                 ─► state=Succeeded ─► running(false)
//!     ├─ Err(Canceled)          ─► state=Cancelled ─► running(false)
//!     └─ Err(e) / panic         ─► SharedState.store(error) ─► error signal
//!                                  state=Failed    ─► running(false)
//!
//! cancel() ──► [lock] state=Cancelled, token.cancel() ──► running(false)
//!              (the worker keeps going until it polls the token)
//! ```
//!
//! ## Rules
//! - `run()` on a running task fails with `AlreadyRunning` and changes nothing.
//! - At most one worker per handle: after `cancel()`, `run()` fails with
//!   `WorkerBusy` until the previous worker has returned from the body.
//! - `running(false)` is emitted exactly once per run, after the terminal state is set.
//! - Signal emissions that order the lifecycle happen under the handle lock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::Config;
use crate::error::{RuntimeError, TaskError, panic_message};
use crate::signals::{DispatchHandle, OwnerId, Signal, SlotId};
use crate::state::SharedState;
use crate::sync::lock;

use super::context::{ERROR, PROGRESS};
use super::{Progress, TaskContext, TaskOutcome, TaskRef, TaskState};

#[derive(Default)]
struct Lifecycle {
    state: TaskState,
    /// True while a worker has not yet returned from the task body.
    worker_active: bool,
    /// Step count frozen at the last `run()`.
    steps: Option<u32>,
    token: Option<CancellationToken>,
    vars: Option<Arc<SharedState>>,
    worker: Option<JoinHandle<()>>,
    runs: u64,
}

struct Shared {
    task: TaskRef,
    name: Arc<str>,
    thread_name: String,
    stack_size: Option<usize>,
    dispatch: DispatchHandle,
    lifecycle: Mutex<Lifecycle>,
    progress: Signal<Progress>,
    error: Signal<String>,
    running: Signal<bool>,
}

/// Runs one [`Task`](super::Task) on a worker thread and tracks its lifecycle.
///
/// Cloning the handle yields another reference to the same state machine.
#[derive(Clone)]
pub struct TaskHandle {
    shared: Arc<Shared>,
}

impl TaskHandle {
    /// Wraps `task` with the default [`Config`].
    pub fn new(task: TaskRef, dispatch: DispatchHandle) -> Self {
        Self::with_config(task, dispatch, &Config::default())
    }

    /// Wraps `task`; worker threads are named and sized according to `cfg`.
    pub fn with_config(task: TaskRef, dispatch: DispatchHandle, cfg: &Config) -> Self {
        let name: Arc<str> = Arc::from(task.name());
        let progress = Signal::new(format!("{name}.progress"), dispatch.clone());
        let error = Signal::new(format!("{name}.error"), dispatch.clone());
        let running = Signal::new(format!("{name}.running"), dispatch.clone());

        let hooks = OwnerId::new();
        let t = Arc::clone(&task);
        progress.connect_owned(hooks, move |p: &Progress| t.progress_changed(p));
        let t = Arc::clone(&task);
        error.connect_owned(hooks, move |e: &String| t.error_raised(e));
        let t = Arc::clone(&task);
        running.connect_owned(hooks, move |r: &bool| t.is_running_changed(*r));

        Self {
            shared: Arc::new(Shared {
                thread_name: cfg.thread_name(&name),
                stack_size: cfg.stack_size(),
                task,
                name,
                dispatch,
                lifecycle: Mutex::new(Lifecycle::default()),
                progress,
                error,
                running,
            }),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Task description.
    pub fn description(&self) -> &str {
        self.shared.task.description()
    }

    /// The wrapped task.
    pub fn task(&self) -> &TaskRef {
        &self.shared.task
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        lock(&self.shared.lifecycle).state
    }

    /// True while the task is in [`TaskState::Running`].
    pub fn is_running(&self) -> bool {
        self.state() == TaskState::Running
    }

    /// True if the last run succeeded.
    pub fn is_completed(&self) -> bool {
        self.state() == TaskState::Succeeded
    }

    /// Whether callers should offer cancellation for this task.
    pub fn is_cancelable(&self) -> bool {
        self.shared.task.is_cancelable()
    }

    /// True while a worker thread has not returned from the task body,
    /// including a worker that keeps going after `cancel()`.
    pub fn is_worker_active(&self) -> bool {
        lock(&self.shared.lifecycle).worker_active
    }

    /// Number of times the task was started.
    pub fn runs(&self) -> u64 {
        lock(&self.shared.lifecycle).runs
    }

    /// Number of progress steps: frozen at `run()`, read live from the task before.
    pub fn progress_steps_count(&self) -> u32 {
        let frozen = lock(&self.shared.lifecycle).steps;
        frozen.unwrap_or_else(|| self.shared.task.progress_steps_count())
    }

    /// Last reported progress; the default snapshot before the first report.
    pub fn progress(&self) -> Progress {
        self.vars()
            .and_then(|vars| vars.get(PROGRESS))
            .unwrap_or_default()
    }

    /// Last failure message of the current run, if any.
    pub fn error(&self) -> Option<String> {
        self.vars().and_then(|vars| vars.get(ERROR))
    }

    /// Outcome of the last finished run; `None` while idle or running.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        match self.state() {
            TaskState::Idle | TaskState::Running => None,
            TaskState::Succeeded => Some(TaskOutcome::Succeeded),
            TaskState::Cancelled => Some(TaskOutcome::Cancelled),
            TaskState::Failed => Some(TaskOutcome::Failed {
                error: self.error().unwrap_or_default(),
            }),
        }
    }

    /// Signal carrying every progress report.
    ///
    /// The [`Task`](super::Task) hooks are connected to the three task signals
    /// under an owner of their own: `disconnect_owner` with any other owner
    /// leaves them alone, while [`Signal::clear`] removes them too.
    pub fn progress_signal(&self) -> &Signal<Progress> {
        &self.shared.progress
    }

    /// Signal carrying failure messages. See [`TaskHandle::progress_signal`].
    pub fn error_signal(&self) -> &Signal<String> {
        &self.shared.error
    }

    /// Signal carrying running-flag changes. See [`TaskHandle::progress_signal`].
    pub fn running_signal(&self) -> &Signal<bool> {
        &self.shared.running
    }

    /// Subscribes to progress reports.
    pub fn connect_progress<F>(&self, f: F) -> SlotId
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.shared.progress.connect(f)
    }

    /// Subscribes to failures.
    pub fn connect_error<F>(&self, f: F) -> SlotId
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.shared.error.connect(f)
    }

    /// Subscribes to running-flag changes.
    pub fn connect_running_changed<F>(&self, f: F) -> SlotId
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.shared.running.connect(f)
    }

    /// Starts the task on a new worker thread and returns immediately.
    ///
    /// ### Errors
    /// - [`RuntimeError::AlreadyRunning`] if the task is running (state unchanged).
    /// - [`RuntimeError::WorkerBusy`] if a cancelled worker has not finished yet.
    /// - [`RuntimeError::Spawn`] if the OS refused the thread (state unchanged).
    pub fn run(&self) -> Result<(), RuntimeError> {
        let shared = &self.shared;
        let mut lc = lock(&shared.lifecycle);

        if lc.state == TaskState::Running {
            return Err(RuntimeError::AlreadyRunning {
                task: shared.name.to_string(),
            });
        }
        if lc.worker_active {
            return Err(RuntimeError::WorkerBusy {
                task: shared.name.to_string(),
            });
        }

        let vars = Arc::new(self.prepare_state());
        let token = CancellationToken::new();
        let steps = shared.task.progress_steps_count();
        let ctx = TaskContext::new(Arc::clone(&shared.name), token.clone(), Arc::clone(&vars));

        let mut builder = thread::Builder::new().name(shared.thread_name.clone());
        if let Some(size) = shared.stack_size {
            builder = builder.stack_size(size);
        }
        // running(true) must be queued before anything the worker emits.
        let previous = std::mem::replace(&mut lc.state, TaskState::Running);
        shared.running.emit(true);

        let worker_shared = Arc::clone(shared);
        match builder.spawn(move || worker_main(worker_shared, ctx)) {
            Ok(join) => {
                lc.worker_active = true;
                lc.steps = Some(steps);
                lc.token = Some(token);
                lc.vars = Some(vars);
                lc.worker = Some(join);
                lc.runs += 1;
                debug!(task = %shared.name, steps, run = lc.runs, "task started");
                Ok(())
            }
            Err(source) => {
                lc.state = previous;
                shared.running.emit(false);
                Err(RuntimeError::Spawn {
                    task: shared.name.to_string(),
                    source,
                })
            }
        }
    }

    /// Requests cooperative cancellation.
    ///
    /// The task immediately reports [`TaskState::Cancelled`] and emits
    /// `running(false)`. The worker thread is not interrupted: it stops only
    /// when the body polls its token, and keeps running otherwise.
    ///
    /// [`is_cancelable`](Self::is_cancelable) is advisory and not consulted here.
    ///
    /// Returns `false` if the task was not running.
    pub fn cancel(&self) -> bool {
        let shared = &self.shared;
        let mut lc = lock(&shared.lifecycle);
        if lc.state != TaskState::Running {
            return false;
        }
        lc.state = TaskState::Cancelled;
        if let Some(token) = &lc.token {
            token.cancel();
        }
        shared.running.emit(false);
        drop(lc);

        shared.dispatch.wake();
        info!(task = %shared.name, "task cancelled");
        true
    }

    /// Blocks until the current worker thread exits.
    ///
    /// Returns `false` if there was no worker to join or it panicked outside
    /// the task body. Must not be called from the controlling thread while the
    /// body waits on a callback.
    pub fn join_worker(&self) -> bool {
        let join = lock(&self.shared.lifecycle).worker.take();
        match join {
            Some(join) => join.join().is_ok(),
            None => false,
        }
    }

    fn vars(&self) -> Option<Arc<SharedState>> {
        lock(&self.shared.lifecycle).vars.clone()
    }

    fn prepare_state(&self) -> SharedState {
        let mut vars = SharedState::new(self.shared.name.to_string());
        vars.replace_with_signal(PROGRESS, self.shared.progress.clone());
        vars.replace_with_signal(ERROR, self.shared.error.clone());
        vars
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .finish()
    }
}

fn worker_main(shared: Arc<Shared>, ctx: TaskContext) {
    debug!(task = %shared.name, "worker started");

    let outcome = match catch_unwind(AssertUnwindSafe(|| shared.task.run_task(&ctx))) {
        Ok(Ok(())) => TaskOutcome::Succeeded,
        Ok(Err(TaskError::Canceled)) => TaskOutcome::Cancelled,
        Ok(Err(err)) => TaskOutcome::Failed {
            error: err.to_string(),
        },
        Err(payload) => TaskOutcome::Failed {
            error: panic_message(payload.as_ref()),
        },
    };

    if let TaskOutcome::Failed { error } = &outcome {
        ctx.vars().store(ERROR, error.clone());
    }
    shared.finish(outcome);
}

impl Shared {
    fn finish(&self, outcome: TaskOutcome) {
        let mut lc = lock(&self.lifecycle);
        lc.worker_active = false;

        if lc.state == TaskState::Running {
            lc.state = outcome.state();
            self.running.emit(false);
            drop(lc);
            match &outcome {
                TaskOutcome::Succeeded => info!(task = %self.name, "task succeeded"),
                TaskOutcome::Cancelled => info!(task = %self.name, "task stopped after cancellation"),
                TaskOutcome::Failed { error } => warn!(task = %self.name, %error, "task failed"),
            }
        } else {
            drop(lc);
            debug!(task = %self.name, ?outcome, "worker returned after cancellation");
        }
        self.dispatch.wake();
    }
}

//! # Supervisor: runs collected tasks one after another.
//!
//! The [`Supervisor`] asks its [`TaskSource`]s for tasks, orders them with a
//! [`TaskOrder`] and runs them strictly sequentially while the controlling
//! thread drains the [`Dispatcher`].
//!
//! ## High-level architecture
//! ```text
//! collect_tasks():
//!   TaskSource[0].tasks() ++ TaskSource[1].tasks() ++ ...   (source order kept)
//!
//! sort_tasks():
//!   TaskOrder::sort(&mut tasks)                             (IdentityOrder by default)
//!
//! run_tasks(&mut dispatcher):
//!   for task in tasks:
//!     ├─ task.run()                        ─► worker thread
//!     ├─ dispatcher.run_until(!running)    ─► callbacks run here, on the controlling thread
//!     ├─ dispatcher.dispatch_pending()     ─► flush what the task emitted last
//!     ├─ task_completed.emit(TaskReport)   ─► flushed before the next task starts
//!     └─ stop? cancel() / FailurePolicy::Abort
//! ```
//!
//! ## Rules
//! - At most one supervised task runs at a time.
//! - A failed task never stops the sequence unless [`FailurePolicy::Abort`] is set.
//! - [`Supervisor::cancel`] cancels the running task and stops after it.
//!
//! ## Example
//! ```rust
//! use taskboss::{Config, Dispatcher, Supervisor, TaskContext, TaskFn, TaskHandle, TaskModule};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dispatcher = Dispatcher::default();
//!     let copy = TaskFn::new("copy", |ctx: &TaskContext| {
//!         ctx.report_progress(1, "copied");
//!         Ok(())
//!     })
//!     .with_steps(1);
//!
//!     let module = TaskModule::new("files")
//!         .with_task(TaskHandle::new(copy.into_ref(), dispatcher.handle()));
//!
//!     let sup = Supervisor::builder(Config::default())
//!         .with_source(module)
//!         .build(&dispatcher);
//!
//!     let reports = sup.run_tasks(&mut dispatcher).await?;
//!     assert!(reports[0].succeeded());
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::SupervisorBuilder;
use super::order::TaskOrder;
use super::report::TaskReport;
use super::source::TaskSource;
use crate::core::Config;
use crate::error::RuntimeError;
use crate::signals::{DispatchHandle, Dispatcher, Signal, SlotId};
use crate::subscribers::LogWriter;
use crate::sync::lock;
use crate::tasks::TaskHandle;

/// Collects tasks from sources and runs them sequentially.
pub struct Supervisor {
    /// Global runtime configuration.
    cfg: Config,
    sources: Vec<Arc<dyn TaskSource>>,
    order: Box<dyn TaskOrder>,
    /// Current collection, in execution order.
    tasks: Mutex<Vec<TaskHandle>>,
    /// Task started by the running sequence, if any.
    running: Mutex<Option<TaskHandle>>,
    /// Stop token of the running sequence; `None` while idle.
    stop: Mutex<Option<CancellationToken>>,
    reports: Mutex<Vec<TaskReport>>,
    completed: Signal<TaskReport>,
    log: LogWriter,
}

impl Supervisor {
    /// Returns a builder for a supervisor configured with `cfg`.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        sources: Vec<Arc<dyn TaskSource>>,
        order: Box<dyn TaskOrder>,
        dispatch: DispatchHandle,
    ) -> Self {
        Self {
            cfg,
            sources,
            order,
            tasks: Mutex::new(Vec::new()),
            running: Mutex::new(None),
            stop: Mutex::new(None),
            reports: Mutex::new(Vec::new()),
            completed: Signal::new("supervisor.task_completed", dispatch),
            log: LogWriter::new(),
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Replaces the collection with the tasks of every source, in source order.
    ///
    /// Returns the number of collected tasks.
    pub fn collect_tasks(&self) -> usize {
        let collected: Vec<TaskHandle> = self
            .sources
            .iter()
            .flat_map(|source| {
                let tasks = source.tasks();
                debug!(source = source.name(), tasks = tasks.len(), "collected tasks");
                tasks
            })
            .collect();

        let mut tasks = lock(&self.tasks);
        if self.cfg.log_tasks {
            for old in tasks.iter() {
                self.log.detach(old);
            }
            for new in &collected {
                self.log.attach(new);
            }
        }
        *tasks = collected;
        tasks.len()
    }

    /// Orders the current collection with the configured [`TaskOrder`].
    pub fn sort_tasks(&self) {
        let mut tasks = lock(&self.tasks);
        self.order.sort(&mut tasks);
    }

    /// Collects, sorts and runs every task, one at a time.
    ///
    /// Callbacks of all signals run inside this call, on the thread owning
    /// `dispatcher`. Returns one report per task that was started.
    ///
    /// ### Errors
    /// - a task refused to start ([`RuntimeError::AlreadyRunning`],
    ///   [`RuntimeError::WorkerBusy`], [`RuntimeError::Spawn`]);
    /// - a subscriber panicked under [`FaultPolicy::Propagate`](crate::FaultPolicy::Propagate).
    ///
    /// The sequence stops at the first error; a task that already started keeps running.
    pub async fn run_tasks(
        &self,
        dispatcher: &mut Dispatcher,
    ) -> Result<Vec<TaskReport>, RuntimeError> {
        let stop = CancellationToken::new();
        *lock(&self.stop) = Some(stop.clone());
        lock(&self.reports).clear();

        let result = self.run_sequence(dispatcher, &stop).await;

        *lock(&self.stop) = None;
        result?;
        Ok(self.reports())
    }

    async fn run_sequence(
        &self,
        dispatcher: &mut Dispatcher,
        stop: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        self.collect_tasks();
        self.sort_tasks();
        let tasks = self.tasks();
        info!(tasks = tasks.len(), total_steps = self.total_progress_steps(), "running tasks");

        for (index, task) in tasks.iter().enumerate() {
            let Some(report) = self.run_one(dispatcher, task, stop).await? else {
                break;
            };
            info!(
                task = %report.name,
                index,
                outcome = report.outcome.state().as_label(),
                "task finished"
            );

            lock(&self.reports).push(report.clone());
            let stop_on_failure = self.cfg.failure_policy.should_stop(&report.outcome);
            self.completed.emit(report);
            dispatcher.dispatch_pending()?;

            if stop_on_failure {
                warn!(task = %task.name(), "stopping after failed task");
                break;
            }
        }

        if stop.is_cancelled() {
            info!("task sequence cancelled");
        }
        Ok(())
    }

    /// Runs `task` to a terminal state. Returns `None` if the sequence was
    /// cancelled before the task started.
    async fn run_one(
        &self,
        dispatcher: &mut Dispatcher,
        task: &TaskHandle,
        stop: &CancellationToken,
    ) -> Result<Option<TaskReport>, RuntimeError> {
        {
            // cancel() looks at `running` after setting the token, so checking
            // the token and starting under this lock leaves no gap.
            let mut running = lock(&self.running);
            if stop.is_cancelled() {
                return Ok(None);
            }
            task.run()?;
            *running = Some(task.clone());
        }

        let result = Self::wait_for(dispatcher, task).await;
        *lock(&self.running) = None;
        result?;
        Ok(Some(TaskReport::from_handle(task)))
    }

    async fn wait_for(dispatcher: &mut Dispatcher, task: &TaskHandle) -> Result<(), RuntimeError> {
        dispatcher.run_until(|| !task.is_running()).await?;
        dispatcher.dispatch_pending()?;
        Ok(())
    }

    /// Cancels the running task and stops the sequence after it.
    ///
    /// Returns `false` if no sequence is running.
    pub fn cancel(&self) -> bool {
        let Some(stop) = lock(&self.stop).clone() else {
            return false;
        };
        stop.cancel();
        if let Some(task) = lock(&self.running).clone() {
            task.cancel();
        }
        info!("cancel requested");
        true
    }

    /// Snapshot of the current collection.
    pub fn tasks(&self) -> Vec<TaskHandle> {
        lock(&self.tasks).clone()
    }

    /// Reports of the tasks finished by the current or last sequence.
    pub fn reports(&self) -> Vec<TaskReport> {
        lock(&self.reports).clone()
    }

    /// Task started by the running sequence, if any.
    pub fn running_task(&self) -> Option<TaskHandle> {
        lock(&self.running).clone()
    }

    /// Sum of the step counts of all collected tasks.
    pub fn total_progress_steps(&self) -> u64 {
        lock(&self.tasks)
            .iter()
            .map(|t| u64::from(t.progress_steps_count()))
            .sum()
    }

    /// Step count of the running task; `0` while idle.
    pub fn task_progress_steps(&self) -> u32 {
        self.running_task()
            .map_or(0, |t| t.progress_steps_count())
    }

    /// Last reported step of the running task; `0` while idle.
    pub fn task_progress(&self) -> u32 {
        self.running_task().map_or(0, |t| t.progress().step)
    }

    /// Signal emitted once per finished task, before the next one starts.
    pub fn task_completed_signal(&self) -> &Signal<TaskReport> {
        &self.completed
    }

    /// Subscribes to task completion reports.
    pub fn connect_task_completed<F>(&self, f: F) -> SlotId
    where
        F: Fn(&TaskReport) + Send + Sync + 'static,
    {
        self.completed.connect(f)
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("sources", &self.sources.len())
            .field("tasks", &lock(&self.tasks).len())
            .field("running", &self.running_task().map(|t| t.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::mpsc;

    use super::*;
    use crate::core::{OrderBy, TaskModule};
    use crate::error::TaskError;
    use crate::policies::{FailurePolicy, FaultPolicy};
    use crate::tasks::{TaskContext, TaskFn, TaskOutcome, TaskState};

    fn task(d: &Dispatcher, name: &'static str, steps: u32, result: Result<(), TaskError>) -> TaskHandle {
        let t = TaskFn::new(name, move |_ctx: &TaskContext| result.clone())
            .with_steps(steps)
            .into_ref();
        TaskHandle::new(t, d.handle())
    }

    fn names(reports: &[TaskReport]) -> Vec<&str> {
        reports.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_runs_all_tasks_in_order_and_sums_steps() {
        let mut d = Dispatcher::default();
        let a = task(&d, "a", 3, Ok(()));
        let b = task(&d, "b", 0, Ok(()));
        let c = task(&d, "c", 7, Ok(()));
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("first").with_task(a.clone()).with_task(b))
            .with_source(TaskModule::new("second").with_task(c))
            .build(&d);

        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(names(&reports), vec!["a", "b", "c"]);
        assert!(reports.iter().all(TaskReport::succeeded));
        assert_eq!(sup.total_progress_steps(), 10);
        assert_eq!(reports[0].steps, 3);
        assert!(a.is_completed());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_sequence() {
        let mut d = Dispatcher::default();
        let bad = task(&d, "bad", 1, Err(TaskError::fail("boom")));
        let good = task(&d, "good", 1, Ok(()));
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(bad.clone()).with_task(good.clone()))
            .build(&d);

        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(names(&reports), vec!["bad", "good"]);
        assert_eq!(reports[0].error(), Some("boom"));
        assert!(!bad.is_running());
        assert!(!bad.is_completed());
        assert_eq!(bad.error().as_deref(), Some("boom"));
        assert!(good.is_completed());
    }

    #[tokio::test]
    async fn test_abort_policy_stops_after_failure() {
        let mut d = Dispatcher::default();
        let bad = task(&d, "bad", 1, Err(TaskError::fail("boom")));
        let never = task(&d, "never", 1, Ok(()));
        let cfg = Config {
            failure_policy: FailurePolicy::Abort,
            ..Config::default()
        };
        let sup = Supervisor::builder(cfg)
            .with_source(TaskModule::new("m").with_task(bad).with_task(never.clone()))
            .build(&d);

        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(names(&reports), vec!["bad"]);
        assert_eq!(never.runs(), 0);
        assert_eq!(never.state(), TaskState::Idle);
    }

    #[tokio::test]
    async fn test_custom_order_is_applied() {
        let mut d = Dispatcher::default();
        let sup = Supervisor::builder(Config::default())
            .with_source(
                TaskModule::new("m")
                    .with_task(task(&d, "long", 9, Ok(())))
                    .with_task(task(&d, "short", 1, Ok(())))
                    .with_task(task(&d, "mid", 5, Ok(()))),
            )
            .with_order(OrderBy::new(|a: &TaskHandle, b: &TaskHandle| {
                a.progress_steps_count().cmp(&b.progress_steps_count())
            }))
            .build(&d);

        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(names(&reports), vec!["short", "mid", "long"]);
    }

    #[tokio::test]
    async fn test_no_sources_is_a_no_op() {
        let mut d = Dispatcher::default();
        let sup = Supervisor::builder(Config::default()).build(&d);
        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert!(reports.is_empty());
        assert_eq!(sup.total_progress_steps(), 0);
        assert!(sup.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_completion_is_reported_before_next_task_starts() {
        let mut d = Dispatcher::default();
        let first = task(&d, "first", 1, Ok(()));
        let second = task(&d, "second", 1, Err(TaskError::fail("late")));
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(first).with_task(second.clone()))
            .build(&d);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        sup.connect_task_completed(move |r: &TaskReport| {
            s.lock()
                .unwrap()
                .push((r.name.clone(), r.succeeded(), second.runs()));
        });

        sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first".to_string(), true, 0), ("second".to_string(), false, 1)]
        );
    }

    #[tokio::test]
    async fn test_getters_follow_the_running_task() {
        let mut d = Dispatcher::default();
        let t = TaskFn::new("halfway", |ctx: &TaskContext| {
            ctx.report_progress(2, "half");
            Ok(())
        })
        .with_steps(4)
        .into_ref();
        let h = TaskHandle::new(t, d.handle());
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(h.clone()))
            .build(&d);

        assert_eq!(sup.task_progress(), 0);
        assert_eq!(sup.task_progress_steps(), 0);
        assert!(sup.running_task().is_none());

        let seen = Arc::new(StdMutex::new(None));
        let s = Arc::clone(&seen);
        let observer = Arc::clone(&sup);
        h.connect_progress(move |_| {
            *s.lock().unwrap() = Some((
                observer.task_progress(),
                observer.task_progress_steps(),
                observer.running_task().map(|t| t.name().to_string()),
            ));
        });

        sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            Some((2, 4, Some("halfway".to_string())))
        );
        assert!(sup.running_task().is_none());
        assert_eq!(sup.task_progress(), 0);
    }

    #[tokio::test]
    async fn test_cancel_stops_the_sequence() {
        let mut d = Dispatcher::default();
        let t = TaskFn::arc("endless", |ctx: &TaskContext| {
            ctx.report_progress(1, "started");
            loop {
                ctx.check_cancelled()?;
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        });
        let endless = TaskHandle::new(t, d.handle());
        let after = task(&d, "after", 1, Ok(()));
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(endless.clone()).with_task(after.clone()))
            .build(&d);

        assert!(!sup.cancel(), "nothing to cancel while idle");
        let s = Arc::clone(&sup);
        endless.connect_progress(move |_| {
            s.cancel();
        });

        let reports = sup.run_tasks(&mut d).await.unwrap();
        assert_eq!(names(&reports), vec!["endless"]);
        assert_eq!(reports[0].outcome, TaskOutcome::Cancelled);
        assert_eq!(after.runs(), 0);
        assert!(endless.join_worker());
    }

    #[tokio::test]
    async fn test_task_started_elsewhere_is_reported_as_error() {
        let mut d = Dispatcher::default();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = StdMutex::new(release_rx);
        let t = TaskFn::arc("busy", move |_ctx: &TaskContext| {
            let _ = release_rx.lock().unwrap().recv();
            Ok(())
        });
        let busy = TaskHandle::new(t, d.handle());
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(busy.clone()))
            .build(&d);

        busy.run().unwrap();
        let err = sup.run_tasks(&mut d).await.unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyRunning { ref task } if task == "busy"));
        assert!(sup.running_task().is_none());
        assert!(!sup.cancel());

        release_tx.send(()).unwrap();
        assert!(busy.join_worker());
    }

    #[tokio::test]
    async fn test_subscriber_fault_under_propagate_stops_the_sequence() {
        let mut d = Dispatcher::with_policy(FaultPolicy::Propagate);
        let t = TaskFn::new("noisy", |ctx: &TaskContext| {
            ctx.report_progress(1, "tick");
            Ok(())
        })
        .with_steps(1)
        .into_ref();
        let noisy = TaskHandle::new(t, d.handle());
        let never = task(&d, "never", 1, Ok(()));
        noisy.connect_progress(|_| panic!("broken observer"));
        let sup = Supervisor::builder(Config::default())
            .with_source(TaskModule::new("m").with_task(noisy.clone()).with_task(never.clone()))
            .build(&d);

        let err = sup.run_tasks(&mut d).await.unwrap_err();
        match err {
            RuntimeError::Subscriber(fault) => {
                assert_eq!(fault.signal, "noisy.progress");
                assert_eq!(fault.message, "broken observer");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sup.running_task().is_none());
        assert!(!sup.cancel(), "sequence is no longer running");
        assert_eq!(never.runs(), 0);
        noisy.join_worker();
    }

    #[tokio::test]
    async fn test_recollect_replaces_tasks_and_log_slots() {
        let d = Dispatcher::default();
        let h = task(&d, "logged", 1, Ok(()));
        let base = h.running_signal().len();
        let cfg = Config {
            log_tasks: true,
            ..Config::default()
        };
        let sup = Supervisor::builder(cfg)
            .with_source(TaskModule::new("m").with_task(h.clone()))
            .build(&d);

        assert_eq!(sup.collect_tasks(), 1);
        assert_eq!(sup.collect_tasks(), 1);
        assert_eq!(sup.tasks().len(), 1);
        assert_eq!(h.running_signal().len(), base + 1);
    }
}

//! # Example: basic_supervisor
//!
//! Three tasks from two modules, run one after another by a [`Supervisor`].
//!
//! Demonstrates how to:
//! - Define blocking tasks with [`TaskFn`] and report progress.
//! - Group them in [`TaskModule`]s and order them with [`OrderBy`].
//! - Observe progress and completion on the controlling thread.
//! - Keep going after a failed task (`FailurePolicy::Continue`).
//!
//! ## Flow
//! ```text
//! Supervisor::run_tasks()
//!     ├─► collect_tasks()  (module "io", module "math")
//!     ├─► sort_tasks()     (fewest steps first)
//!     └─► for each task:
//!           ├─► TaskHandle::run()      ─► worker thread
//!           ├─► progress / error       ─► callbacks on this thread
//!           └─► task_completed(report) ─► next task
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic_supervisor
//! ```

use std::thread;
use std::time::Duration;

use taskboss::{
    Config, Dispatcher, OrderBy, Supervisor, TaskContext, TaskError, TaskFn, TaskHandle,
    TaskModule, TaskRef, TaskReport,
};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Runtime configuration: log every task through tracing.
    let cfg = Config {
        log_tasks: true,
        ..Config::default()
    };
    let mut dispatcher = Dispatcher::new(&cfg);

    // 2. Define blocking tasks.
    let copy = TaskFn::new("copy", |ctx: &TaskContext| {
        for (i, file) in ["a.txt", "b.txt", "c.txt"].iter().enumerate() {
            ctx.check_cancelled()?;
            thread::sleep(Duration::from_millis(150));
            ctx.report_progress(i as u32 + 1, format!("copied {file}"));
        }
        Ok(())
    })
    .with_description("copies three files")
    .with_steps(3);

    let parse = TaskFn::new("parse", |ctx: &TaskContext| {
        ctx.report_progress(1, "reading header");
        thread::sleep(Duration::from_millis(100));
        Err(TaskError::fail("unexpected end of input"))
    })
    .with_steps(2);

    let sum = TaskFn::new("sum", |ctx: &TaskContext| {
        let total: u64 = (1..=1_000_000u64).sum();
        ctx.report_progress(1, format!("total = {total}"));
        Ok(())
    })
    .with_steps(1);

    // 3. Wrap them in handles and group them into modules.
    let handle = |task: TaskRef| TaskHandle::with_config(task, dispatcher.handle(), &cfg);
    let copy = handle(copy.into_ref());
    copy.connect_progress(|p| println!("copy: {}/3 {}", p.step, p.message));

    let io = TaskModule::new("io").with_task(copy).with_task(handle(parse.into_ref()));
    let math = TaskModule::new("math").with_task(handle(sum.into_ref()));

    // 4. Build the supervisor; fewest steps first.
    let sup = Supervisor::builder(cfg.clone())
        .with_source(io)
        .with_source(math)
        .with_order(OrderBy::new(|a: &TaskHandle, b: &TaskHandle| {
            a.progress_steps_count().cmp(&b.progress_steps_count())
        }))
        .build(&dispatcher);

    sup.connect_task_completed(|r: &TaskReport| match r.error() {
        None => println!("[done] {} ({:?})", r.name, r.outcome.state()),
        Some(err) => println!("[done] {} failed: {err}", r.name),
    });

    // 5. Run everything on this thread.
    let reports = sup.run_tasks(&mut dispatcher).await?;
    let ok = reports.iter().filter(|r| r.succeeded()).count();
    println!("{ok}/{} tasks succeeded", reports.len());
    Ok(())
}

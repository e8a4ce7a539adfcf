//! # Example: task_cancel
//!
//! A single [`TaskHandle`] driven by hand, without a supervisor, and cancelled
//! from the controlling thread once it reports enough progress.
//!
//! Demonstrates how to:
//! - Run a task and drain the [`Dispatcher`] until it stops.
//! - Cancel from a scoped progress callback and tear it down afterwards.
//! - Read state, progress and the worker flag after cancellation.
//!
//! ## Flow
//! ```text
//! TaskHandle::run() ─► worker: loop { check_cancelled()?; report_progress() }
//!     ├─► progress(step >= 5) ─► cancel() ─► state=Cancelled, running(false)
//!     └─► worker polls the token ─► Err(Canceled) ─► worker exits
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example task_cancel
//! ```

use std::thread;
use std::time::Duration;

use taskboss::{Config, Dispatcher, LogWriter, TaskContext, TaskFn, TaskHandle};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::default();
    let mut dispatcher = Dispatcher::new(&cfg);

    let ticker = TaskFn::new("ticker", |ctx: &TaskContext| {
        let mut step = 0;
        loop {
            ctx.check_cancelled()?;
            step += 1;
            ctx.report_progress(step, format!("tick {step}"));
            thread::sleep(Duration::from_millis(50));
        }
    })
    .with_steps(100);

    let task = TaskHandle::with_config(ticker.into_ref(), dispatcher.handle(), &cfg);
    let log = LogWriter::new();
    log.attach(&task);

    // The slot holds a clone of the handle; the scoped subscription breaks
    // that cycle when it is dropped.
    let canceller = task.clone();
    let cancel_at_five = task.progress_signal().connect_scoped(move |p| {
        if p.step >= 5 && canceller.cancel() {
            println!("cancelled at step {}", p.step);
        }
    });

    task.run()?;
    dispatcher
        .run_until(|| !task.is_running() && !task.is_worker_active())
        .await?;
    dispatcher.dispatch_pending()?;

    println!(
        "state={} last={:?} worker_active={}",
        task.state(),
        task.progress().message,
        task.is_worker_active()
    );
    drop(cancel_at_five);
    log.detach(&task);
    Ok(())
}

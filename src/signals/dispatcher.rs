//! # Dispatcher: the controlling thread's job queue.
//!
//! [`Dispatcher`] owns the receiving end of an unbounded [`tokio::sync::mpsc`]
//! channel. Worker threads hold [`DispatchHandle`]s (cheap clones of the sender)
//! and enqueue jobs without ever blocking. The controlling thread drains the
//! queue and runs every job itself.
//!
//! ## Architecture
//! ```text
//! Publishers (any thread):             Controlling thread (one):
//!   Signal::emit ──┐
//!   Signal::emit ──┼──► [unbounded mpsc] ──► Dispatcher::dispatch_*() ──► callback(&T)
//!   handle.wake() ─┘                                     └─► panic caught → FaultPolicy
//! ```
//!
//! ## Rules
//! - **Pinned**: a `Dispatcher` is `!Send`; the thread that creates it is the controlling thread.
//! - **FIFO**: jobs run in the order they were enqueued, across all signals sharing the dispatcher.
//! - **Isolation**: a panicking job never prevents the following jobs from running.
//! - **Non-blocking publish**: enqueueing never blocks and never fails loudly.

use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{error, trace};

use crate::core::Config;
use crate::error::{SubscriberFault, panic_message};
use crate::policies::FaultPolicy;

use super::SlotId;

/// Unit of work executed on the controlling thread.
pub(crate) enum Job {
    /// No-op used to wake a waiting controlling thread.
    Wake,
    /// One subscriber invocation. `call` returns `false` if the slot was gone.
    Invoke {
        signal: Arc<str>,
        slot: SlotId,
        call: Box<dyn FnOnce() -> bool + Send>,
    },
}

/// Sending side of the dispatch queue. Cloneable and usable from any thread.
#[derive(Clone, Debug)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl DispatchHandle {
    /// Enqueues a job; returns `false` if the dispatcher is gone.
    pub(crate) fn submit(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }

    /// Wakes the controlling thread if it is waiting in [`Dispatcher::dispatch_next`].
    pub fn wake(&self) {
        let _ = self.tx.send(Job::Wake);
    }

    /// True once the owning [`Dispatcher`] was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side of the dispatch queue, owned by the controlling thread.
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Job>,
    handle: DispatchHandle,
    policy: FaultPolicy,
    thread: ThreadId,
    // Keeps the dispatcher on the thread that created it.
    _not_send: PhantomData<*const ()>,
}

impl Dispatcher {
    /// Creates a dispatcher; the calling thread becomes the controlling thread.
    pub fn new(cfg: &Config) -> Self {
        Self::with_policy(cfg.fault_policy)
    }

    /// Creates a dispatcher with an explicit [`FaultPolicy`].
    pub fn with_policy(policy: FaultPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: DispatchHandle { tx },
            policy,
            thread: thread::current().id(),
            _not_send: PhantomData,
        }
    }

    /// Returns a new sender into this dispatcher.
    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Id of the controlling thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }

    /// Fault policy applied to panicking subscribers.
    pub fn fault_policy(&self) -> FaultPolicy {
        self.policy
    }

    /// Runs every job already queued without waiting for new ones.
    ///
    /// Returns the number of subscriber callbacks invoked. With
    /// [`FaultPolicy::Propagate`] the first fault is returned and the remaining
    /// jobs stay queued for the next call.
    pub fn dispatch_pending(&mut self) -> Result<usize, SubscriberFault> {
        let mut invoked = 0;
        loop {
            match self.rx.try_recv() {
                Ok(job) => {
                    if self.execute(job)? {
                        invoked += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(invoked),
            }
        }
    }

    /// Waits for the next job and runs it.
    pub async fn dispatch_next(&mut self) -> Result<(), SubscriberFault> {
        // The dispatcher keeps its own sender, so the channel never closes here.
        if let Some(job) = self.rx.recv().await {
            self.execute(job)?;
        }
        Ok(())
    }

    /// Blocking flavour of [`Dispatcher::dispatch_next`] for controlling threads
    /// that do not run an async runtime.
    ///
    /// # Panics
    /// Panics when called from within an async execution context.
    pub fn blocking_dispatch_next(&mut self) -> Result<(), SubscriberFault> {
        if let Some(job) = self.rx.blocking_recv() {
            self.execute(job)?;
        }
        Ok(())
    }

    /// Dispatches jobs until `done` returns true.
    ///
    /// `done` is evaluated before every wait, so a condition that is already
    /// satisfied returns immediately.
    pub async fn run_until<F>(&mut self, mut done: F) -> Result<(), SubscriberFault>
    where
        F: FnMut() -> bool,
    {
        while !done() {
            self.dispatch_next().await?;
        }
        Ok(())
    }

    fn execute(&self, job: Job) -> Result<bool, SubscriberFault> {
        debug_assert_eq!(thread::current().id(), self.thread);

        let Job::Invoke { signal, slot, call } = job else {
            return Ok(false);
        };
        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(ran) => {
                if !ran {
                    trace!(signal = %signal, %slot, "skipped disconnected subscriber");
                }
                Ok(ran)
            }
            Err(payload) => {
                let fault = SubscriberFault {
                    signal: signal.to_string(),
                    slot,
                    message: panic_message(payload.as_ref()),
                };
                match self.policy {
                    FaultPolicy::Log => {
                        error!(signal = %fault.signal, slot = %fault.slot, "subscriber panicked: {}", fault.message);
                        Ok(true)
                    }
                    FaultPolicy::Propagate => Err(fault),
                }
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_policy(FaultPolicy::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("thread", &self.thread)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(slot: u64, call: impl FnOnce() -> bool + Send + 'static) -> Job {
        Job::Invoke {
            signal: Arc::from("test"),
            slot: SlotId::from_raw(slot),
            call: Box::new(call),
        }
    }

    #[test]
    fn test_pending_runs_in_fifo_order() {
        let mut d = Dispatcher::default();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = Arc::clone(&seen);
            d.handle().submit(job(i, move || {
                seen.lock().unwrap().push(i);
                true
            }));
        }
        assert_eq!(d.dispatch_pending().unwrap(), 5);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(d.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn test_wake_and_skipped_jobs_are_not_counted() {
        let mut d = Dispatcher::default();
        d.handle().wake();
        d.handle().submit(job(1, || false));
        assert_eq!(d.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn test_log_policy_keeps_dispatching_after_panic() {
        let mut d = Dispatcher::with_policy(FaultPolicy::Log);
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran2 = Arc::clone(&ran);
        d.handle().submit(job(1, || panic!("boom")));
        d.handle().submit(job(2, move || {
            ran2.store(true, std::sync::atomic::Ordering::SeqCst);
            true
        }));
        assert_eq!(d.dispatch_pending().unwrap(), 2);
        assert!(ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_propagate_policy_returns_fault_and_keeps_rest_queued() {
        let mut d = Dispatcher::with_policy(FaultPolicy::Propagate);
        d.handle().submit(job(7, || panic!("bad subscriber")));
        d.handle().submit(job(8, || true));

        let fault = d.dispatch_pending().unwrap_err();
        assert_eq!(fault.slot, SlotId::from_raw(7));
        assert_eq!(fault.message, "bad subscriber");
        assert_eq!(fault.signal, "test");

        assert_eq!(d.dispatch_pending().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_until_returns_immediately_when_done() {
        let mut d = Dispatcher::default();
        d.run_until(|| true).await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_next_is_woken_from_another_thread() {
        let mut d = Dispatcher::default();
        let h = d.handle();
        let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag2 = Arc::clone(&flag);
        let t = std::thread::spawn(move || {
            flag2.store(true, std::sync::atomic::Ordering::SeqCst);
            h.wake();
        });
        d.run_until(|| flag.load(std::sync::atomic::Ordering::SeqCst))
            .await
            .unwrap();
        t.join().unwrap();
    }

    #[test]
    fn test_blocking_dispatch_runs_worker_emission_on_controlling_thread() {
        let mut d = Dispatcher::default();
        let signal: crate::signals::Signal<u32> = crate::signals::Signal::new("counter", d.handle());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        signal.connect(move |v: &u32| s.lock().unwrap().push((*v, thread::current().id())));

        let emitter = signal.clone();
        let worker = thread::spawn(move || emitter.emit(7));
        d.blocking_dispatch_next().unwrap();
        worker.join().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(7, d.thread_id())]);
    }

    #[test]
    fn test_blocking_dispatch_returns_on_wake() {
        let mut d = Dispatcher::default();
        let h = d.handle();
        let waker = thread::spawn(move || h.wake());
        d.blocking_dispatch_next().unwrap();
        waker.join().unwrap();
        assert_eq!(d.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn test_handle_reports_closed_after_drop() {
        let d = Dispatcher::default();
        let h = d.handle();
        assert!(!h.is_closed());
        drop(d);
        assert!(h.is_closed());
        assert!(!h.submit(Job::Wake));
    }
}

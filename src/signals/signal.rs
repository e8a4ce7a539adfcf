//! # Signal: multi-subscriber notification channel.
//!
//! A [`Signal<T>`] keeps an ordered list of subscriber slots. [`Signal::emit`]
//! may be called from any thread: it snapshots the slots and enqueues one job
//! per slot on the [`Dispatcher`](super::Dispatcher), so every callback runs on
//! the controlling thread.
//!
//! ## Diagram
//! ```text
//!    emit(value)                         (one Arc<T> shared by all jobs)
//!        │
//!        ├──► Job(slot 1) ─┐
//!        ├──► Job(slot 2) ─┼──► dispatch queue ──► controlling thread
//!        └──► Job(slot N) ─┘                        ├─ slot still connected? ─► callback(&value)
//!                                                   └─ otherwise skipped
//! ```
//!
//! ## Guarantees
//! - Jobs from one `emit` run in registration order.
//! - Jobs from successive `emit`s on the same signal run in emission order.
//! - A slot removed before its job runs is never invoked.
//! - Slots are held strongly until [`disconnect`](Signal::disconnect),
//!   [`disconnect_owner`](Signal::disconnect_owner), [`clear`](Signal::clear), or
//!   until the [`Subscription`] guard returned by [`connect_scoped`](Signal::connect_scoped) is dropped.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::sync::lock;

use super::dispatcher::{DispatchHandle, Job};

static NEXT_SLOT: AtomicU64 = AtomicU64::new(1);
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Token identifying one subscriber registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    fn next() -> Self {
        SlotId(NEXT_SLOT.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        SlotId(raw)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Identity of an object owning several subscriptions.
///
/// Slots connected with [`Signal::connect_owned`] can be removed together with
/// [`Signal::disconnect_owner`] when the owner goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Allocates a fresh, process-unique owner id.
    pub fn new() -> Self {
        OwnerId(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    id: SlotId,
    owner: Option<OwnerId>,
    callback: Callback<T>,
}

struct Inner<T> {
    name: Arc<str>,
    dispatch: DispatchHandle,
    slots: Mutex<Vec<Slot<T>>>,
}

impl<T> Inner<T> {
    fn is_connected(&self, id: SlotId) -> bool {
        lock(&self.slots).iter().any(|s| s.id == id)
    }

    fn remove(&self, id: SlotId) -> bool {
        let mut slots = lock(&self.slots);
        match slots.iter().position(|s| s.id == id) {
            Some(idx) => {
                slots.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Multi-subscriber notification channel delivering on the controlling thread.
///
/// Cloning a `Signal` yields another handle to the same subscriber list.
pub struct Signal<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a signal whose callbacks are dispatched through `dispatch`.
    pub fn new(name: impl Into<Cow<'static, str>>, dispatch: DispatchHandle) -> Self {
        let name: Cow<'static, str> = name.into();
        Self {
            inner: Arc::new(Inner {
                name: Arc::from(name.as_ref()),
                dispatch,
                slots: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Signal name used in logs and [`SubscriberFault`](crate::SubscriberFault)s.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registers a callback. It stays connected until explicitly removed.
    pub fn connect<F>(&self, callback: F) -> SlotId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.push(None, Arc::new(callback))
    }

    /// Registers a callback on behalf of `owner`.
    pub fn connect_owned<F>(&self, owner: OwnerId, callback: F) -> SlotId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.push(Some(owner), Arc::new(callback))
    }

    /// Registers a callback that is disconnected when the returned guard is dropped.
    #[must_use = "dropping the subscription disconnects the callback immediately"]
    pub fn connect_scoped<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let slot = self.connect(callback);
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            slot,
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(slot);
                }
            })),
        }
    }

    /// Removes one registration. Returns `false` if it was not connected.
    pub fn disconnect(&self, slot: SlotId) -> bool {
        self.inner.remove(slot)
    }

    /// Removes every slot registered by `owner`; returns how many were removed.
    pub fn disconnect_owner(&self, owner: OwnerId) -> usize {
        let mut slots = lock(&self.inner.slots);
        let before = slots.len();
        slots.retain(|s| s.owner != Some(owner));
        before - slots.len()
    }

    /// Removes all subscribers.
    pub fn clear(&self) {
        lock(&self.inner.slots).clear();
    }

    /// Number of connected subscribers.
    pub fn len(&self) -> usize {
        lock(&self.inner.slots).len()
    }

    /// True if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `slot` is currently connected.
    pub fn is_connected(&self, slot: SlotId) -> bool {
        self.inner.is_connected(slot)
    }

    /// Schedules every current subscriber with `value` on the controlling thread.
    ///
    /// Returns immediately. If the dispatcher is gone the emission is dropped.
    pub fn emit(&self, value: T) {
        let snapshot: Vec<(SlotId, Callback<T>)> = lock(&self.inner.slots)
            .iter()
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect();
        if snapshot.is_empty() {
            trace!(signal = %self.inner.name, "emit without subscribers");
            return;
        }

        let value = Arc::new(value);
        for (slot, callback) in snapshot {
            let weak = Arc::downgrade(&self.inner);
            let value = Arc::clone(&value);
            let job = Job::Invoke {
                signal: Arc::clone(&self.inner.name),
                slot,
                call: Box::new(move || {
                    let Some(inner) = weak.upgrade() else {
                        return false;
                    };
                    if !inner.is_connected(slot) {
                        return false;
                    }
                    callback(&value);
                    true
                }),
            };
            if !self.inner.dispatch.submit(job) {
                trace!(signal = %self.inner.name, "dispatcher closed; emission dropped");
                return;
            }
        }
    }

    fn push(&self, owner: Option<OwnerId>, callback: Callback<T>) -> SlotId {
        let id = SlotId::next();
        lock(&self.inner.slots).push(Slot {
            id,
            owner,
            callback,
        });
        id
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("slots", &lock(&self.inner.slots).len())
            .finish()
    }
}

/// Scoped registration returned by [`Signal::connect_scoped`].
pub struct Subscription {
    slot: SlotId,
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Slot held by this subscription.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Keeps the callback connected for the lifetime of the signal.
    pub fn forget(mut self) -> SlotId {
        self.detach = None;
        self.slot
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("slot", &self.slot)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use super::*;
    use crate::signals::Dispatcher;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        (log, move |s: &str| l.lock().unwrap().push(s.to_string()))
    }

    #[test]
    fn test_emit_invokes_each_subscriber_once_in_registration_order() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let (log, rec) = recorder();
        for tag in ["a", "b", "c"] {
            let rec = rec.clone();
            sig.connect(move |v: &u32| rec(&format!("{tag}{v}")));
        }

        sig.emit(7);
        assert!(log.lock().unwrap().is_empty(), "emit must not invoke inline");
        assert_eq!(d.dispatch_pending().unwrap(), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_emissions_keep_fifo_order() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let (log, rec) = recorder();
        sig.connect(move |v: &u32| rec(&v.to_string()));

        for v in 1..=4 {
            sig.emit(v);
        }
        d.dispatch_pending().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_emit_from_worker_runs_on_controlling_thread() {
        let mut d = Dispatcher::default();
        let controlling = d.thread_id();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            sig.connect(move |v: &u32| seen.lock().unwrap().push((*v, thread::current().id())));
        }

        let worker_sig = sig.clone();
        let worker = thread::spawn(move || {
            worker_sig.emit(42);
            thread::current().id()
        })
        .join()
        .unwrap();

        d.dispatch_pending().unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for (v, tid) in seen.iter() {
            assert_eq!(*v, 42);
            assert_eq!(*tid, controlling);
            assert_ne!(*tid, worker);
        }
    }

    #[test]
    fn test_disconnect_stops_delivery_even_for_queued_jobs() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let (log, rec) = recorder();
        let rec2 = rec.clone();
        let gone = sig.connect(move |v: &u32| rec(&format!("gone{v}")));
        sig.connect(move |v: &u32| rec2(&format!("kept{v}")));

        sig.emit(1);
        assert!(sig.disconnect(gone));
        assert!(!sig.disconnect(gone));
        sig.emit(2);

        d.dispatch_pending().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["kept1", "kept2"]);
    }

    #[test]
    fn test_disconnect_owner_removes_only_owner_slots() {
        let d = Dispatcher::default();
        let sig: Signal<()> = Signal::new("unit", d.handle());
        let owner = OwnerId::new();
        let other = OwnerId::new();
        sig.connect_owned(owner, |_| {});
        sig.connect_owned(owner, |_| {});
        sig.connect_owned(other, |_| {});
        sig.connect(|_| {});

        assert_eq!(sig.disconnect_owner(owner), 2);
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.disconnect_owner(owner), 0);
    }

    #[test]
    fn test_scoped_subscription_disconnects_on_drop() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let (log, rec) = recorder();
        let sub = sig.connect_scoped(move |v: &u32| rec(&v.to_string()));
        let slot = sub.slot();

        sig.emit(1);
        d.dispatch_pending().unwrap();
        drop(sub);
        assert!(!sig.is_connected(slot));
        sig.emit(2);
        d.dispatch_pending().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["1"]);

        let kept = sig.connect_scoped(|_| {}).forget();
        assert!(sig.is_connected(kept));
    }

    #[test]
    fn test_clear_and_empty_emit() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        sig.connect(|_| {});
        sig.connect(|_| {});
        sig.emit(1);
        sig.clear();
        assert!(sig.is_empty());
        sig.emit(2);
        assert_eq!(d.dispatch_pending().unwrap(), 0);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let (log, rec) = recorder();
        sig.connect(|_| panic!("faulty observer"));
        sig.connect(move |v: &u32| rec(&v.to_string()));

        sig.emit(1);
        sig.emit(2);
        d.dispatch_pending().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_connect_during_emit_from_other_threads() {
        let mut d = Dispatcher::default();
        let sig: Signal<u32> = Signal::new("numbers", d.handle());
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        sig.connect(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let emitters: Vec<_> = (0..4)
            .map(|_| {
                let s = sig.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        s.emit(i);
                    }
                })
            })
            .collect();
        for _ in 0..50 {
            let slot = sig.connect(|_| {});
            sig.disconnect(slot);
        }
        for e in emitters {
            e.join().unwrap();
        }

        d.dispatch_pending().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 400);
    }
}

//! # SharedState: independently locked variables shared between threads.
//!
//! A worker thread writes, the controlling thread reads. Every variable lives
//! in its own cell guarded by its own lock, so storing progress never contends
//! with storing an error.
//!
//! ## Cells
//! ```text
//! capacity 1 (register / register_with_signal):
//!   store(v) ─► [ v ]           overwrite; get = v; take = v and clear
//!
//! capacity N (register_queued):
//!   store(v) ─► [ a, b, …, v ]  append, drop oldest when full
//!               get = a (peek); take = a (pop)
//! ```
//!
//! ## Rules
//! - Registration needs `&mut self`: all variables exist before the state is shared.
//! - `store` releases the cell lock before emitting the change signal.
//! - Accessing a name that was never registered (or with the wrong type) is a
//!   programming error: the plain accessors panic, the `try_*` ones return
//!   [`StateError::InvalidVariable`].

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;

use crate::error::StateError;
use crate::signals::Signal;
use crate::sync::lock;

use super::Var;

struct Cell<T> {
    values: Mutex<VecDeque<T>>,
    capacity: usize,
    on_change: Option<Signal<T>>,
}

impl<T> Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn store(&self, value: T) {
        let notify = self.on_change.as_ref().map(|sig| (sig, value.clone()));
        {
            let mut values = lock(&self.values);
            while values.len() >= self.capacity {
                values.pop_front();
            }
            values.push_back(value);
        }
        if let Some((sig, value)) = notify {
            sig.emit(value);
        }
    }

    fn get(&self) -> Option<T> {
        lock(&self.values).front().cloned()
    }

    fn take(&self) -> Option<T> {
        lock(&self.values).pop_front()
    }

    fn len(&self) -> usize {
        lock(&self.values).len()
    }
}

/// Collection of independently locked, typed variables.
pub struct SharedState {
    name: String,
    cells: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    order: Vec<&'static str>,
}

impl SharedState {
    /// Creates an empty state named `name` (used in logs).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Name of this state instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered variable names, in registration order.
    pub fn variables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// True if a variable named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    /// Registers a single-value cell.
    pub fn register<T>(&mut self, var: Var<T>) -> Result<(), StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(var, 1, None)
    }

    /// Registers a single-value cell that emits `on_change` with every stored value.
    pub fn register_with_signal<T>(
        &mut self,
        var: Var<T>,
        on_change: Signal<T>,
    ) -> Result<(), StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(var, 1, Some(on_change))
    }

    /// Registers a bounded FIFO cell keeping up to `capacity` values (min 1).
    pub fn register_queued<T>(&mut self, var: Var<T>, capacity: usize) -> Result<(), StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(var, capacity.max(1), None)
    }

    /// Stores `value`, then emits the change signal if one is attached.
    pub fn try_store<T>(&self, var: Var<T>, value: T) -> Result<(), StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.cell(var)?.store(value);
        Ok(())
    }

    /// Returns a clone of the current (oldest) value without removing it.
    pub fn try_get<T>(&self, var: Var<T>) -> Result<Option<T>, StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.cell(var)?.get())
    }

    /// Removes and returns the current (oldest) value in one lock acquisition.
    pub fn try_take<T>(&self, var: Var<T>) -> Result<Option<T>, StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.cell(var)?.take())
    }

    /// True if the cell holds a value.
    pub fn try_is_set<T>(&self, var: Var<T>) -> Result<bool, StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.cell(var)?.len() > 0)
    }

    /// Number of values held by the cell (at most its capacity).
    pub fn try_len<T>(&self, var: Var<T>) -> Result<usize, StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.cell(var)?.len())
    }

    /// See [`SharedState::try_store`].
    ///
    /// # Panics
    /// Panics if `var` is not registered with value type `T`.
    pub fn store<T>(&self, var: Var<T>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_store(var, value).unwrap_or_else(|e| panic!("{e}"))
    }

    /// See [`SharedState::try_get`].
    ///
    /// # Panics
    /// Panics if `var` is not registered with value type `T`.
    pub fn get<T>(&self, var: Var<T>) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_get(var).unwrap_or_else(|e| panic!("{e}"))
    }

    /// See [`SharedState::try_take`].
    ///
    /// # Panics
    /// Panics if `var` is not registered with value type `T`.
    pub fn take<T>(&self, var: Var<T>) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_take(var).unwrap_or_else(|e| panic!("{e}"))
    }

    /// See [`SharedState::try_is_set`].
    ///
    /// # Panics
    /// Panics if `var` is not registered with value type `T`.
    pub fn is_set<T>(&self, var: Var<T>) -> bool
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_is_set(var).unwrap_or_else(|e| panic!("{e}"))
    }

    /// See [`SharedState::try_len`].
    ///
    /// # Panics
    /// Panics if `var` is not registered with value type `T`.
    pub fn len<T>(&self, var: Var<T>) -> usize
    where
        T: Clone + Send + Sync + 'static,
    {
        self.try_len(var).unwrap_or_else(|e| panic!("{e}"))
    }

    fn insert<T>(
        &mut self,
        var: Var<T>,
        capacity: usize,
        on_change: Option<Signal<T>>,
    ) -> Result<(), StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        if self.cells.contains_key(var.name()) {
            return Err(StateError::AlreadyRegistered {
                name: var.name().to_string(),
            });
        }
        self.put(var, capacity, on_change);
        Ok(())
    }

    /// Registers a single-value cell with a change signal, replacing any cell of the same name.
    pub(crate) fn replace_with_signal<T>(&mut self, var: Var<T>, on_change: Signal<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.put(var, 1, Some(on_change));
    }

    fn put<T>(&mut self, var: Var<T>, capacity: usize, on_change: Option<Signal<T>>)
    where
        T: Clone + Send + Sync + 'static,
    {
        let cell = Cell {
            values: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            on_change,
        };
        if self.cells.insert(var.name(), Box::new(cell)).is_none() {
            self.order.push(var.name());
        }
    }

    fn cell<T>(&self, var: Var<T>) -> Result<&Cell<T>, StateError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.cells
            .get(var.name())
            .and_then(|cell| cell.downcast_ref::<Cell<T>>())
            .ok_or_else(|| StateError::InvalidVariable {
                name: var.name().to_string(),
            })
    }
}

impl fmt::Display for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.order.join(", "))
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("name", &self.name)
            .field("variables", &self.order)
            .finish()
    }
}

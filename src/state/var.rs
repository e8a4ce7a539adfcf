use std::fmt;
use std::marker::PhantomData;

/// Typed key of a [`SharedState`](super::SharedState) variable.
///
/// The name identifies the cell; the type parameter fixes the value type, so a
/// key declared once as a constant gives type-checked access everywhere.
///
/// ```
/// use taskboss::Var;
///
/// const RETRIES: Var<u32> = Var::new("retries");
/// assert_eq!(RETRIES.name(), "retries");
/// ```
pub struct Var<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Var<T> {
    /// Declares a variable key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Variable name.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Var<T> {}

impl<T> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var<{}>({:?})", std::any::type_name::<T>(), self.name)
    }
}

//! Per-component lifecycle callbacks.
//!
//! A [`System`] associates up to three callbacks with a component type:
//! `on_create` fires when a value is added, `on_update` fires for every
//! value during [`Registry::run_update`](crate::registry::Registry::run_update),
//! and `on_destroy` fires just before a value is removed (including removals
//! caused by entity destruction and by dropping the registry itself).
//!
//! Callbacks receive a mutable reference to the affected value and run
//! synchronously on the caller's stack.

use std::fmt;

/// A boxed lifecycle callback for component values of type `T`.
pub type Callback<T> = Box<dyn FnMut(&mut T)>;

/// Lifecycle callbacks for a component type, installed with
/// [`Registry::register_system`](crate::registry::Registry::register_system).
///
/// All three callbacks are optional; build the descriptor with the chained
/// setters:
///
/// ```
/// use sparse_ecs::System;
///
/// let system = System::<u32>::new()
///     .on_create(|value| *value += 1)
///     .on_destroy(|value| println!("dropping {value}"));
/// ```
pub struct System<T> {
    on_create: Option<Callback<T>>,
    on_update: Option<Callback<T>>,
    on_destroy: Option<Callback<T>>,
}

impl<T> System<T> {
    /// A descriptor with no callbacks installed.
    pub fn new() -> Self {
        Self {
            on_create: None,
            on_update: None,
            on_destroy: None,
        }
    }

    /// Install the callback fired once per added value, before `add` returns.
    pub fn on_create(mut self, callback: impl FnMut(&mut T) + 'static) -> Self {
        self.on_create = Some(Box::new(callback));
        self
    }

    /// Install the callback fired for every stored value on `run_update`.
    pub fn on_update(mut self, callback: impl FnMut(&mut T) + 'static) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    /// Install the callback fired once per value, just before it is removed.
    pub fn on_destroy(mut self, callback: impl FnMut(&mut T) + 'static) -> Self {
        self.on_destroy = Some(Box::new(callback));
        self
    }

    /// Dispatch `on_create` for a freshly added value.
    pub(crate) fn created(&mut self, value: &mut T) {
        if let Some(callback) = &mut self.on_create {
            callback(value);
        }
    }

    /// Dispatch `on_update` for one stored value.
    pub(crate) fn updated(&mut self, value: &mut T) {
        if let Some(callback) = &mut self.on_update {
            callback(value);
        }
    }

    /// Dispatch `on_destroy` for a value about to be removed.
    pub(crate) fn destroyed(&mut self, value: &mut T) {
        if let Some(callback) = &mut self.on_destroy {
            callback(value);
        }
    }
}

impl<T> Default for System<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for System<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("on_create", &self.on_create.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unset_callbacks_are_no_ops() {
        // Given
        let mut system = System::<i32>::new();
        let mut value = 1;

        // When
        system.created(&mut value);
        system.updated(&mut value);
        system.destroyed(&mut value);

        // Then
        assert_eq!(value, 1);
    }

    #[test]
    fn callbacks_receive_the_value_mutably() {
        // Given
        let mut system = System::<i32>::new()
            .on_create(|v| *v += 10)
            .on_update(|v| *v *= 2)
            .on_destroy(|v| *v = 0);
        let mut value = 1;

        // When / Then
        system.created(&mut value);
        assert_eq!(value, 11);

        system.updated(&mut value);
        assert_eq!(value, 22);

        system.destroyed(&mut value);
        assert_eq!(value, 0);
    }

    #[test]
    fn callbacks_may_capture_state() {
        // Given
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut system = System::<&str>::new().on_create(move |v| sink.borrow_mut().push(*v));

        // When
        system.created(&mut "first");
        system.created(&mut "second");

        // Then
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn debug_reports_installed_callbacks() {
        // Given
        let system = System::<i32>::new().on_update(|_| {});

        // Then
        assert_eq!(
            format!("{system:?}"),
            "System { on_create: false, on_update: true, on_destroy: false }"
        );
    }
}

//! Typed component storage and its type-erased face.
//!
//! A [`Store<T>`] layers a dense `values` array over a [`SparseSet`] of
//! entity indices, keeping the two aligned under swap-removal so that
//! `values[i]` is always the component of the entity at `keys()[i]`. The
//! store also owns the component's optional [`System`] descriptor and
//! dispatches its callbacks at the add/remove/update seams.
//!
//! The registry holds stores behind the crate-internal [`AnyStore`] trait
//! object, which is how entity destruction can clear a component without
//! knowing its type: the erased `destroy_for` method is the trait-object
//! rendition of a stored destroy function pointer.
//!
//! # Reference stability
//!
//! A reference returned by [`Store::add`] or [`Store::get_mut`] stays valid
//! until the next mutation of the *same* store; mutations of other stores
//! never move these values.

use std::any::{type_name, Any};

use crate::storage::sparse::SparseSet;
use crate::system::System;

/// Dense storage of `T` values keyed by entity index.
pub struct Store<T: 'static> {
    /// Which entity indices are present, and where.
    set: SparseSet<usize>,

    /// Component values, parallel to the sparse set's packed keys.
    values: Vec<T>,

    /// Lifecycle callbacks for this component type, if registered.
    system: Option<System<T>>,
}

impl<T: 'static> Store<T> {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self {
            set: SparseSet::new(),
            values: Vec::new(),
            system: None,
        }
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the entity index has a value here.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.set.contains(index)
    }

    /// The entity indices with a value here, in packed order.
    #[inline]
    pub fn keys(&self) -> &[usize] {
        self.set.keys()
    }

    /// The stored values, in packed order.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Insert a value for the entity index, dispatch `on_create`, and return
    /// a reference to the stored value.
    ///
    /// # Panics
    /// If the index already has a value of this type.
    pub fn add(&mut self, index: usize, value: T) -> &mut T {
        assert!(
            !self.contains(index),
            "entity {index} already has a {} component",
            type_name::<T>()
        );
        self.set.push(index);
        self.values.push(value);

        let position = self.values.len() - 1;
        let value = &mut self.values[position];
        if let Some(system) = &mut self.system {
            system.created(value);
        }
        value
    }

    /// Dispatch `on_destroy`, then remove and return the value for the
    /// entity index. The last value is swapped into the vacated position.
    ///
    /// # Panics
    /// If the index has no value of this type.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            self.contains(index),
            "entity {index} does not have a {} component",
            type_name::<T>()
        );
        let position = self.set.position(index);
        if let Some(system) = &mut self.system {
            system.destroyed(&mut self.values[position]);
        }
        self.set.pop(index);
        self.values.swap_remove(position)
    }

    /// A shared reference to the value for the entity index.
    ///
    /// # Panics
    /// If the index has no value of this type.
    #[inline]
    pub fn get(&self, index: usize) -> &T {
        assert!(
            self.contains(index),
            "entity {index} does not have a {} component",
            type_name::<T>()
        );
        &self.values[self.set.position(index)]
    }

    /// A mutable reference to the value for the entity index.
    ///
    /// # Panics
    /// If the index has no value of this type.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        assert!(
            self.contains(index),
            "entity {index} does not have a {} component",
            type_name::<T>()
        );
        let position = self.set.position(index);
        &mut self.values[position]
    }

    /// Install (or replace) the lifecycle callbacks for this component type.
    pub fn set_system(&mut self, system: System<T>) {
        self.system = Some(system);
    }

    /// Dispatch `on_update` for every stored value, in packed order.
    pub fn run_update(&mut self) {
        if let Some(system) = &mut self.system {
            for value in self.values.iter_mut() {
                system.updated(value);
            }
        }
    }
}

impl<T: 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Drop for Store<T> {
    /// Dropping the store dispatches `on_destroy` for every surviving value
    /// before the values themselves are dropped.
    fn drop(&mut self) {
        if let Some(system) = &mut self.system {
            for value in self.values.iter_mut() {
                system.destroyed(value);
            }
        }
    }
}

/// The type-erased face a [`Store<T>`] presents to the registry.
///
/// Everything the registry and views need without knowing `T`: membership
/// and key access for joins, and the destroy trampoline used when an entity
/// is torn down.
pub(crate) trait AnyStore {
    /// Number of stored values.
    fn len(&self) -> usize;

    /// Whether the entity index has a value here.
    fn contains_index(&self, index: usize) -> bool;

    /// The entity index at the given packed position.
    fn key_at(&self, position: usize) -> usize;

    /// If the entity index has a value, dispatch `on_destroy` and remove it.
    fn destroy_for(&mut self, index: usize);

    /// The component type's name, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AnyStore for Store<T> {
    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn contains_index(&self, index: usize) -> bool {
        self.contains(index)
    }

    #[inline]
    fn key_at(&self, position: usize) -> usize {
        self.set.key_at(position)
    }

    fn destroy_for(&mut self, index: usize) {
        if self.contains(index) {
            self.remove(index);
        }
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn add_get_remove_round_trip() {
        // Given
        let mut store = Store::new();

        // When
        store.add(3, 42i32);

        // Then
        assert!(store.contains(3));
        assert_eq!(*store.get(3), 42);

        // When
        let removed = store.remove(3);

        // Then
        assert_eq!(removed, 42);
        assert!(!store.contains(3));
        assert!(store.is_empty());
    }

    #[test]
    fn values_stay_aligned_with_keys() {
        // Given
        let mut store = Store::new();
        store.add(5, "five");
        store.add(2, "two");
        store.add(9, "nine");
        store.add(7, "seven");

        // When - swap-remove moves the last pair into the hole
        store.remove(2);

        // Then
        assert_eq!(store.keys(), &[5, 7, 9]);
        assert_eq!(store.values(), &["five", "seven", "nine"]);
        for (position, key) in store.keys().iter().enumerate() {
            assert_eq!(store.values()[position], *store.get(*key));
        }
    }

    #[test]
    fn get_mut_mutates_in_place() {
        // Given
        let mut store = Store::new();
        store.add(0, 1u32);

        // When
        *store.get_mut(0) += 41;

        // Then
        assert_eq!(*store.get(0), 42);
    }

    #[test]
    fn create_callback_runs_before_add_returns() {
        // Given
        let mut store = Store::new();
        store.set_system(System::new().on_create(|value: &mut i32| *value += 1));

        // When
        let value = store.add(0, 10);

        // Then - the reference already observes the callback's mutation
        assert_eq!(*value, 11);
    }

    #[test]
    fn destroy_callback_sees_the_value_before_removal() {
        // Given
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut store = Store::new();
        store.set_system(System::new().on_destroy(move |value: &mut i32| {
            sink.borrow_mut().push(*value);
        }));
        store.add(1, 7);

        // When
        let removed = store.remove(1);

        // Then
        assert_eq!(removed, 7);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn run_update_visits_every_value_in_packed_order() {
        // Given
        let visited = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&visited);
        let mut store = Store::new();
        store.set_system(System::new().on_update(move |value: &mut i32| {
            sink.borrow_mut().push(*value);
        }));
        store.add(4, 40);
        store.add(1, 10);
        store.add(8, 80);

        // When
        store.run_update();

        // Then
        assert_eq!(*visited.borrow(), vec![40, 10, 80]);
    }

    #[test]
    fn erased_destroy_is_a_no_op_for_absent_indices() {
        // Given
        let mut store = Store::new();
        store.add(2, 1.5f64);
        let erased: &mut dyn AnyStore = &mut store;

        // When
        erased.destroy_for(9);

        // Then
        assert_eq!(erased.len(), 1);

        // When
        erased.destroy_for(2);

        // Then
        assert_eq!(erased.len(), 0);
    }

    #[test]
    fn drop_dispatches_destroy_for_survivors() {
        // Given
        let destroyed = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&destroyed);
        {
            let mut store = Store::new();
            store.set_system(System::new().on_destroy(move |_: &mut i32| {
                *sink.borrow_mut() += 1;
            }));
            store.add(0, 1);
            store.add(1, 2);
            store.add(2, 3);
            store.remove(1);

            // When - the store goes out of scope with two survivors
        }

        // Then - one removal plus two survivors
        assert_eq!(*destroyed.borrow(), 3);
    }

    #[test]
    #[should_panic(expected = "already has a")]
    fn double_add_panics() {
        let mut store = Store::new();
        store.add(0, 1i32);
        store.add(0, 2);
    }

    #[test]
    #[should_panic(expected = "does not have a")]
    fn remove_absent_panics() {
        let mut store: Store<i32> = Store::new();
        store.remove(0);
    }
}

//! The registry: the façade that ties identifiers, storage, and views
//! together.
//!
//! A [`Registry`] owns the entity slot table and one type-erased component
//! store per component type. Component types are plain `'static` Rust types;
//! the first `add` (or `register_system`) for a type assigns it a dense
//! [`TypeId`] and creates its store lazily.
//!
//! # Architecture
//!
//! - **[`EntityTable`]**: slot allocation, generational validity, hierarchy.
//! - **[`Store<T>`]**: per-type dense value storage and lifecycle dispatch.
//! - **[`TypeRegistry`]**: the per-registry type→dense-id map.
//! - **[`View`]**: joined iteration across several stores, built with
//!   [`Registry::view`].
//!
//! Identifiers are plain `Copy` values; every operation is a method on the
//! registry, so a handle can never outlive the data it names. Misusing a
//! handle (stale, null, component absent, hierarchy cycle) is a programming
//! error and panics; probing is done with [`is_valid`](Registry::is_valid),
//! [`has`](Registry::has), and the `try_*` accessors.
//!
//! # Example
//!
//! ```
//! use sparse_ecs::{Id64, Registry};
//!
//! struct Position { x: f32, y: f32 }
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut registry = Registry::<Id64>::new();
//! let entity = registry.create_entity();
//! registry.add(entity, Position { x: 0.0, y: 0.0 });
//! registry.add(entity, Velocity { dx: 1.0, dy: 2.0 });
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, (position, velocity)| {
//!     position.x += velocity.dx;
//!     position.y += velocity.dy;
//! });
//!
//! assert_eq!(registry.get::<Position>(entity).y, 2.0);
//! registry.destroy_entity(entity);
//! assert!(!registry.is_valid(entity));
//! ```

mod types;

pub use types::{TypeId, TypeRegistry};

use std::any::type_name;
use std::fmt;

use log::warn;

use crate::entity::{EntityTable, Id64, Identifier};
use crate::storage::{AnyStore, Store};
use crate::system::System;
use crate::view::{Fetch, View};

/// Hook invoked for every freshly created entity.
type CreateHook<I> = Box<dyn FnMut(&mut Registry<I>, I)>;

/// A registry of entities and their components.
///
/// Generic over the identifier width: [`Id32`](crate::entity::Id32) for the
/// compact 20/12-bit profile, [`Id64`] (the default) for 32/32.
pub struct Registry<I: Identifier = Id64> {
    /// Entity slots, free list, and hierarchy.
    table: EntityTable<I>,

    /// Per-registry dense component type ids.
    types: TypeRegistry,

    /// Component stores, indexed by dense type id.
    stores: Vec<Option<Box<dyn AnyStore>>>,

    /// Hook invoked once per created entity, if set.
    on_entity_create: Option<CreateHook<I>>,
}

impl<I: Identifier> Default for Registry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Identifier> Registry<I> {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self {
            table: EntityTable::new(),
            types: TypeRegistry::new(),
            stores: Vec::new(),
            on_entity_create: None,
        }
    }

    // ==================== Entity lifecycle ====================

    /// Create a new entity and return its identifier.
    ///
    /// Reuses a destroyed slot (with a bumped generation) when one is free.
    /// The `on_entity_create` hook, if set, runs before this returns and may
    /// itself add components to the new entity.
    pub fn create_entity(&mut self) -> I {
        let id = self.table.allocate();
        if let Some(mut hook) = self.on_entity_create.take() {
            hook(self, id);
            // The hook may have installed a replacement while running.
            if self.on_entity_create.is_none() {
                self.on_entity_create = Some(hook);
            }
        }
        id
    }

    /// Destroy a live entity.
    ///
    /// Unlinks it from its parent, detaches its children (they become
    /// roots), removes every component it holds (dispatching `on_destroy`
    /// where a system is registered), and recycles the slot.
    ///
    /// # Panics
    /// If the identifier is not live.
    pub fn destroy_entity(&mut self, id: I) {
        assert!(self.is_valid(id), "cannot destroy invalid entity {id:?}");
        self.table.unlink_from_parent(id);
        self.table.detach_children(id);

        let index = id.index();
        for store in self.stores.iter_mut().rev().flatten() {
            if store.contains_index(index) {
                store.destroy_for(index);
            }
        }
        self.table.free(id);
    }

    /// Destroy a live entity and, recursively, all of its descendants.
    ///
    /// Children are consumed from the front so the traversal stays sound
    /// while the children lists shrink underneath it.
    ///
    /// # Panics
    /// If the identifier is not live.
    pub fn destroy_with_children(&mut self, id: I) {
        assert!(self.is_valid(id), "cannot destroy invalid entity {id:?}");
        while let Some(child) = self.table.children(id).first().copied() {
            self.destroy_with_children(child);
        }
        self.destroy_entity(id);
    }

    /// Destroy every live entity.
    pub fn destroy_all(&mut self) {
        let live: Vec<I> = self.table.iter().collect();
        for id in live {
            if self.is_valid(id) {
                self.destroy_entity(id);
            } else {
                warn!("skipping {id:?}: already destroyed during bulk destruction");
            }
        }
    }

    /// Whether the identifier names a live entity.
    #[inline]
    pub fn is_valid(&self, id: I) -> bool {
        self.table.is_valid(id)
    }

    /// Number of live entities.
    #[inline]
    pub fn entities_count(&self) -> usize {
        self.table.count()
    }

    /// Iterate the identifiers of all live entities, in slot order.
    pub fn entities(&self) -> impl Iterator<Item = I> + '_ {
        self.table.iter()
    }

    /// Install the hook invoked once per created entity.
    pub fn set_on_entity_create(&mut self, hook: impl FnMut(&mut Registry<I>, I) + 'static) {
        self.on_entity_create = Some(Box::new(hook));
    }

    /// Remove the entity-creation hook.
    pub fn clear_on_entity_create(&mut self) {
        self.on_entity_create = None;
    }

    // ==================== Components ====================

    /// Add a component value to a live entity and return a reference to it.
    ///
    /// Creates the store for `T` on first use. If a [`System`] is registered
    /// for `T`, its `on_create` callback runs before this returns.
    ///
    /// # Panics
    /// If the identifier is not live, or the entity already has a `T`.
    pub fn add<T: 'static>(&mut self, id: I, value: T) -> &mut T {
        assert!(
            self.is_valid(id),
            "cannot add {} to invalid entity {id:?}",
            type_name::<T>()
        );
        let index = id.index();
        self.ensure_store::<T>().add(index, value)
    }

    /// Remove the `T` component from a live entity and return the value.
    ///
    /// If a [`System`] is registered for `T`, its `on_destroy` callback runs
    /// before the value is taken out of storage.
    ///
    /// # Panics
    /// If the identifier is not live, or the entity has no `T`.
    pub fn remove<T: 'static>(&mut self, id: I) -> T {
        assert!(
            self.is_valid(id),
            "cannot remove {} from invalid entity {id:?}",
            type_name::<T>()
        );
        let index = id.index();
        match self.store_mut::<T>() {
            Some(store) => store.remove(index),
            None => panic!(
                "entity {index} does not have a {} component",
                type_name::<T>()
            ),
        }
    }

    /// A shared reference to the entity's `T` component.
    ///
    /// # Panics
    /// If the identifier is not live, or the entity has no `T`.
    pub fn get<T: 'static>(&self, id: I) -> &T {
        assert!(
            self.is_valid(id),
            "cannot get {} from invalid entity {id:?}",
            type_name::<T>()
        );
        let index = id.index();
        match self.store::<T>() {
            Some(store) => store.get(index),
            None => panic!(
                "entity {index} does not have a {} component",
                type_name::<T>()
            ),
        }
    }

    /// A mutable reference to the entity's `T` component.
    ///
    /// # Panics
    /// If the identifier is not live, or the entity has no `T`.
    pub fn get_mut<T: 'static>(&mut self, id: I) -> &mut T {
        assert!(
            self.is_valid(id),
            "cannot get {} from invalid entity {id:?}",
            type_name::<T>()
        );
        let index = id.index();
        match self.store_mut::<T>() {
            Some(store) => store.get_mut(index),
            None => panic!(
                "entity {index} does not have a {} component",
                type_name::<T>()
            ),
        }
    }

    /// A shared reference to the entity's `T`, or `None` if the handle is
    /// stale or the component absent.
    pub fn try_get<T: 'static>(&self, id: I) -> Option<&T> {
        if !self.has::<T>(id) {
            return None;
        }
        Some(self.get(id))
    }

    /// A mutable reference to the entity's `T`, or `None` if the handle is
    /// stale or the component absent.
    pub fn try_get_mut<T: 'static>(&mut self, id: I) -> Option<&mut T> {
        if !self.has::<T>(id) {
            return None;
        }
        Some(self.get_mut(id))
    }

    /// Whether the identifier is live and the entity has a `T` component.
    pub fn has<T: 'static>(&self, id: I) -> bool {
        self.is_valid(id)
            && self
                .store::<T>()
                .is_some_and(|store| store.contains(id.index()))
    }

    // ==================== Systems ====================

    /// Install lifecycle callbacks for component type `T`.
    ///
    /// May be called before or after the first `T` is added; replaces any
    /// previously registered system for `T`.
    pub fn register_system<T: 'static>(&mut self, system: System<T>) {
        self.ensure_store::<T>().set_system(system);
    }

    /// Dispatch `on_update` for every stored `T` value, in storage order.
    ///
    /// Does nothing when no `T` store exists or no `on_update` is installed.
    pub fn run_update<T: 'static>(&mut self) {
        if let Some(store) = self.store_mut::<T>() {
            store.run_update();
        }
    }

    // ==================== Views ====================

    /// Build a joined view over the component types in `F`.
    ///
    /// `F` is a tuple of up to eight distinct component types; the view
    /// visits exactly the entities holding all of them. If any requested
    /// type has never been added, the view is empty.
    pub fn view<F: Fetch<I>>(&mut self) -> View<'_, I, F> {
        View::new(self)
    }

    // ==================== Hierarchy ====================

    /// The parent of a live entity, if it has one.
    ///
    /// # Panics
    /// If the identifier is not live.
    pub fn parent(&self, id: I) -> Option<I> {
        let parent = self.table.parent(id);
        if parent.is_null() {
            None
        } else {
            Some(parent)
        }
    }

    /// The ordered children of a live entity.
    ///
    /// # Panics
    /// If the identifier is not live.
    #[inline]
    pub fn children(&self, id: I) -> &[I] {
        self.table.children(id)
    }

    /// Whether a live entity has a parent.
    #[inline]
    pub fn has_parent(&self, id: I) -> bool {
        self.parent(id).is_some()
    }

    /// Whether a live entity has any children.
    #[inline]
    pub fn has_children(&self, id: I) -> bool {
        !self.children(id).is_empty()
    }

    /// Make `child` a child of `parent`.
    ///
    /// # Panics
    /// If either identifier is not live, if `parent == child`, if `child`
    /// already has a parent, or if the link would create a cycle.
    pub fn add_child(&mut self, parent: I, child: I) {
        self.table.add_child(parent, child);
    }

    /// Undo [`add_child`](Self::add_child); `child` becomes a root.
    ///
    /// # Panics
    /// If either identifier is not live, or `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: I, child: I) {
        self.table.remove_child(parent, child);
    }

    /// Re-parent a live entity, or unlink it when `parent` is `None`.
    pub fn set_parent(&mut self, id: I, parent: Option<I>) {
        self.table.set_parent(id, parent.unwrap_or(I::NULL));
    }

    /// Whether `ancestor` appears anywhere on the parent chain above `id`.
    pub fn is_child_of(&self, id: I, ancestor: I) -> bool {
        self.table.is_child_of(id, ancestor)
    }

    // ==================== Store plumbing ====================

    /// The typed store for `T`, creating it (and its dense id) on first use.
    fn ensure_store<T: 'static>(&mut self) -> &mut Store<T> {
        let type_id = self.types.register::<T>();
        let index = type_id.index();
        if index >= self.stores.len() {
            self.stores.resize_with(index + 1, || None);
        }
        let slot = &mut self.stores[index];
        if slot.is_none() {
            *slot = Some(Box::new(Store::<T>::new()));
        }
        slot.as_mut()
            .and_then(|store| store.as_any_mut().downcast_mut::<Store<T>>())
            .expect("store registered under a different type")
    }

    /// The typed store for `T`, if it exists.
    fn store<T: 'static>(&self) -> Option<&Store<T>> {
        let type_id = self.types.get::<T>()?;
        self.stores
            .get(type_id.index())?
            .as_ref()?
            .as_any()
            .downcast_ref::<Store<T>>()
    }

    /// The typed store for `T` mutably, if it exists.
    fn store_mut<T: 'static>(&mut self) -> Option<&mut Store<T>> {
        let type_id = self.types.get::<T>()?;
        self.stores
            .get_mut(type_id.index())?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<Store<T>>()
    }

    /// Dense id and raw pointer to the `T` store, for view fetch plumbing.
    pub(crate) fn store_ptr<T: 'static>(&mut self) -> Option<(TypeId, *mut Store<T>)> {
        let type_id = self.types.get::<T>()?;
        let store = self.store_mut::<T>()?;
        Some((type_id, store as *mut Store<T>))
    }

    /// Raw pointer to an already-resolved store's erased face.
    pub(crate) fn erased_ptr(&mut self, type_id: TypeId) -> *mut dyn AnyStore {
        let store = self.stores[type_id.index()]
            .as_mut()
            .expect("view resolved a store that does not exist");
        store.as_mut() as *mut dyn AnyStore
    }

    /// The entity slot table, for view plumbing.
    pub(crate) fn entity_table(&self) -> &EntityTable<I> {
        &self.table
    }
}

impl<I: Identifier> fmt::Debug for Registry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stores: Vec<(&'static str, usize)> = self
            .stores
            .iter()
            .flatten()
            .map(|store| (store.type_name(), store.len()))
            .collect();
        f.debug_struct("Registry")
            .field("entities", &self.table.count())
            .field("stores", &stores)
            .finish()
    }
}

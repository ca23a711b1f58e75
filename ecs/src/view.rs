//! Joined iteration over multiple component stores.
//!
//! A [`View`] visits exactly the entities that hold *all* of the requested
//! component types. The store with the fewest values is picked as the
//! **driver**: the view walks the driver's packed key array and skips any
//! key absent from one of the other stores, so the cost is proportional to
//! the smallest store, not the whole registry.
//!
//! The request is a tuple of up to eight distinct component types:
//!
//! ```
//! use sparse_ecs::{Id64, Registry};
//!
//! struct Position(f32);
//! struct Velocity(f32);
//!
//! let mut registry = Registry::<Id64>::new();
//! let entity = registry.create_entity();
//! registry.add(entity, Position(0.0));
//! registry.add(entity, Velocity(2.0));
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, (position, velocity)| {
//!     position.0 += velocity.0;
//! });
//! ```
//!
//! If any requested type has never been added to the registry, the view is
//! silently empty. Iteration order is the driver's packed order; no ordering
//! is guaranteed across views or across store mutations.
//!
//! # Mutation during iteration
//!
//! [`View::each`] exclusively borrows the registry for the duration of the
//! walk, so the closure cannot add or remove components or entities: the
//! invalidation hazards of mutating a store mid-join are ruled out at
//! compile time. Entities appended to a store between building the view and
//! calling `each` are visited only if the driver's length snapshot covers
//! them.

use std::marker::PhantomData;

use crate::entity::{EntityTable, Identifier};
use crate::registry::{Registry, TypeId};
use crate::storage::{AnyStore, Store};

/// A tuple of component types that can be fetched jointly for one entity.
///
/// Implemented for tuples of one through eight distinct `'static` types.
/// The consumer-facing item is the matching tuple of mutable references, in
/// declared order.
pub trait Fetch<I: Identifier>: 'static {
    /// The references handed to the consumer for one entity.
    type Item<'s>;

    /// Raw pointers to the resolved stores, in declared order.
    type Ptrs: Copy;

    /// Resolve every requested store, or `None` if any is missing.
    ///
    /// # Panics
    /// If the same component type is requested more than once (the aliasing
    /// that would imply is unsound).
    fn resolve(registry: &mut Registry<I>) -> Option<(Vec<TypeId>, Self::Ptrs)>;

    /// Fetch the item for an entity index.
    ///
    /// # Safety
    /// The pointers must come from [`resolve`](Self::resolve) on a registry
    /// that has not been mutated since, the stores must be pairwise
    /// distinct, and `index` must be contained in every one of them.
    unsafe fn fetch<'s>(ptrs: Self::Ptrs, index: usize) -> Self::Item<'s>;
}

/// A lazy join over the component stores named by `F`.
///
/// Built with [`Registry::view`]; consumed by [`each`](View::each).
pub struct View<'r, I: Identifier, F: Fetch<I>> {
    registry: &'r mut Registry<I>,
    _fetch: PhantomData<F>,
}

impl<'r, I: Identifier, F: Fetch<I>> View<'r, I, F> {
    /// Construct a view over the registry.
    pub(crate) fn new(registry: &'r mut Registry<I>) -> Self {
        Self {
            registry,
            _fetch: PhantomData,
        }
    }

    /// Walk the join, handing each matching entity's identifier and
    /// component references to `consumer`, in the driver's packed order.
    pub fn each(self, mut consumer: impl FnMut(I, F::Item<'_>)) {
        let registry: *mut Registry<I> = self.registry;
        unsafe {
            let Some((ids, ptrs)) = F::resolve(&mut *registry) else {
                return;
            };
            let stores: Vec<*mut dyn AnyStore> = ids
                .iter()
                .map(|&type_id| (*registry).erased_ptr(type_id))
                .collect();

            // The smallest store drives; the rest are membership predicates.
            let driver_position = (0..stores.len())
                .min_by_key(|&position| (*stores[position]).len())
                .unwrap_or(0);
            let driver = stores[driver_position];
            let others: Vec<*mut dyn AnyStore> = stores
                .iter()
                .enumerate()
                .filter(|&(position, _)| position != driver_position)
                .map(|(_, &store)| store)
                .collect();

            let table = (*registry).entity_table() as *const EntityTable<I>;
            let len = (*driver).len();
            let mut position = 0;
            while position < len && position < (*driver).len() {
                let key = (*driver).key_at(position);
                if others.iter().all(|&store| (*store).contains_index(key)) {
                    let id = (*table).id_at(key);
                    consumer(id, F::fetch(ptrs, key));
                }
                position += 1;
            }
        }
    }

    /// Collect the identifiers the join would visit, in visit order.
    pub fn entities(self) -> Vec<I> {
        let mut out = Vec::new();
        self.each(|id, _| out.push(id));
        out
    }
}

/// Panic if the same component type appears twice in one request.
fn assert_distinct(ids: &[TypeId]) {
    for (position, id) in ids.iter().enumerate() {
        assert!(
            !ids[..position].contains(id),
            "a view must not request the same component type twice"
        );
    }
}

macro_rules! impl_fetch {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<Id: Identifier, $($name: 'static),+> Fetch<Id> for ($($name,)+) {
            type Item<'s> = ($(&'s mut $name,)+);
            type Ptrs = ($(*mut Store<$name>,)+);

            fn resolve(registry: &mut Registry<Id>) -> Option<(Vec<TypeId>, Self::Ptrs)> {
                $(let $name = registry.store_ptr::<$name>()?;)+
                let ids = vec![$($name.0),+];
                assert_distinct(&ids);
                Some((ids, ($($name.1,)+)))
            }

            unsafe fn fetch<'s>(ptrs: Self::Ptrs, index: usize) -> Self::Item<'s> {
                let ($($name,)+) = ptrs;
                ($((*$name).get_mut(index),)+)
            }
        }
    };
}

/// Apply `impl_fetch` to every tuple prefix of the listed type parameters.
macro_rules! for_every_tuple {
    ($head:ident) => {
        impl_fetch!($head);
    };
    ($head:ident, $($tail:ident),+) => {
        impl_fetch!($head, $($tail),+);
        for_every_tuple!($($tail),+);
    };
}

for_every_tuple!(A, B, C, D, E, F, G, H);

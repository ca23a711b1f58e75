//! Dense per-registry component type ids.
//!
//! Every component type gets a compact `u32` id the first time the registry
//! sees it, assigned monotonically from zero, so the store table can be a
//! plain vector indexed by id. The counter is scoped to one [`TypeRegistry`]
//! instance: two registries may disagree about ids, and nothing leaks
//! through process-wide statics or across dynamic-library boundaries.
//!
//! Reads are lock-free via a sharded concurrent map; registration takes the
//! entry lock only for a type's first appearance.

use std::any::TypeId as StdTypeId;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

/// A dense identifier for a registered component type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Construct a type id from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The id as an index into id-keyed storage (e.g. the store table).
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TypeId {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// Maps Rust types to dense per-registry [`TypeId`]s.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Map from Rust TypeId to the dense id. Lock-free reads.
    type_map: DashMap<StdTypeId, TypeId>,

    /// Next dense id to hand out.
    next_id: AtomicU32,
}

impl TypeRegistry {
    /// Create a new, empty type registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// The id for type `T`, assigning the next dense id on first use.
    pub fn register<T: 'static>(&self) -> TypeId {
        let std_type_id = StdTypeId::of::<T>();

        // Fast path: already registered (lock-free read).
        if let Some(existing) = self.type_map.get(&std_type_id) {
            return *existing;
        }

        // Slow path: the entry API arbitrates a first-use race.
        match self.type_map.entry(std_type_id) {
            dashmap::Entry::Occupied(occupied) => *occupied.get(),
            dashmap::Entry::Vacant(vacant) => {
                let id = TypeId(self.next_id.fetch_add(1, Ordering::Relaxed));
                vacant.insert(id);
                id
            }
        }
    }

    /// The id for type `T`, if it has been registered.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<TypeId> {
        self.type_map
            .get(&StdTypeId::of::<T>())
            .map(|entry| *entry.value())
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    /// Whether no types have been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

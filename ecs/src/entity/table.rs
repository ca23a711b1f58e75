//! The entity slot table: generational recycling and parent/child links.
//!
//! Each slot holds the identifier currently issued for it, the parent
//! identifier (or null), and the ordered list of child identifiers. Freed
//! slots are chained into an intrusive free list: the slot's own `id` field
//! is repurposed so that its index half points at the next free slot (or
//! holds the null pattern at the end of the chain) and its generation half
//! already carries the generation the slot will advertise when reallocated.
//!
//! Allocation pops the free-list head, falling back to appending a new slot;
//! the table grows but never shrinks. A maintained `live` counter backs
//! [`EntityTable::count`] so no free-list walk is ever needed.
//!
//! Hierarchy links are kept symmetric at all times: `parent(c) == p` exactly
//! when `c` is in `children(p)`, a child has at most one parent, and the
//! parent relation is acyclic. Violating preconditions (linking to a stale
//! handle, re-parenting an already-parented child, introducing a cycle) is a
//! programming error and panics.

use log::warn;

use crate::entity::Identifier;

/// One entry in the slot table.
#[derive(Debug, Clone)]
struct Slot<I> {
    /// The identifier issued for this slot, or the free-list chaining value.
    id: I,

    /// The parent identifier, or null.
    parent: I,

    /// Ordered child identifiers; no duplicates.
    children: Vec<I>,
}

/// The entity slot table with generational identifier recycling.
#[derive(Debug, Clone)]
pub struct EntityTable<I: Identifier> {
    /// The slot array; grows, never shrinks.
    slots: Vec<Slot<I>>,

    /// Head of the intrusive free list, or null when every slot is live.
    free_head: I,

    /// Number of live slots.
    live: usize,
}

impl<I: Identifier> Default for EntityTable<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Identifier> EntityTable<I> {
    /// Construct an empty table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: I::NULL,
            live: 0,
        }
    }

    /// Number of live entities.
    #[inline]
    pub fn count(&self) -> usize {
        self.live
    }

    /// Number of slots ever created, live or free.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether the identifier is currently live: non-null, in range, and an
    /// exact match (index and generation) for the slot it names.
    #[inline]
    pub fn is_valid(&self, id: I) -> bool {
        !id.is_null() && id.index() < self.slots.len() && self.slots[id.index()].id == id
    }

    /// The live identifier stored at a slot position.
    ///
    /// # Panics
    /// If the position is out of range.
    #[inline]
    pub(crate) fn id_at(&self, position: usize) -> I {
        self.slots[position].id
    }

    /// Iterate the identifiers of all live entities, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = I> + '_ {
        self.slots.iter().enumerate().filter_map(|(position, slot)| {
            // A free slot's index field points elsewhere (or is null).
            if slot.id.index() == position {
                Some(slot.id)
            } else {
                None
            }
        })
    }

    /// Allocate a slot and return its identifier.
    ///
    /// Pops the free-list head if there is one (reusing the slot with its
    /// pre-bumped generation), otherwise appends a fresh slot at generation
    /// zero.
    ///
    /// # Panics
    /// If the slot space of the identifier width is exhausted.
    pub fn allocate(&mut self) -> I {
        let id = if self.free_head.is_null() {
            let index = self.slots.len();
            assert!(
                index < I::NULL.index(),
                "entity slot space exhausted ({} slots)",
                index
            );
            let id = I::from_parts(index, 0);
            self.slots.push(Slot {
                id,
                parent: I::NULL,
                children: Vec::new(),
            });
            id
        } else {
            let position = self.free_head.index();
            let stored = self.slots[position].id;
            self.free_head = if stored.is_null() {
                I::NULL
            } else {
                I::from_parts(stored.index(), 0)
            };
            let id = I::from_parts(position, stored.generation());
            let slot = &mut self.slots[position];
            debug_assert!(slot.children.is_empty());
            slot.id = id;
            slot.parent = I::NULL;
            id
        };
        self.live += 1;
        id
    }

    /// Release a live slot back to the free list, bumping its generation.
    ///
    /// The caller is responsible for having unlinked the entity from the
    /// hierarchy first; see [`unlink_from_parent`](Self::unlink_from_parent)
    /// and [`detach_children`](Self::detach_children).
    ///
    /// # Panics
    /// If the identifier is not live.
    pub fn free(&mut self, id: I) {
        assert!(self.is_valid(id), "cannot free invalid entity {id:?}");
        let position = id.index();
        let next_generation = I::mask_generation(id.generation() + 1);
        if next_generation == 0 {
            warn!(
                "generation wrapped for entity slot {position}; stale handles may collide"
            );
        }
        let next_free = if self.free_head.is_null() {
            I::NULL.index()
        } else {
            self.free_head.index()
        };
        self.slots[position].id = I::from_parts(next_free, next_generation);
        self.free_head = I::from_parts(position, next_generation);
        self.live -= 1;
    }

    /// The parent of a live entity, or null.
    ///
    /// # Panics
    /// If the identifier is not live.
    #[inline]
    pub fn parent(&self, id: I) -> I {
        assert!(self.is_valid(id), "invalid entity {id:?}");
        self.slots[id.index()].parent
    }

    /// The ordered children of a live entity.
    ///
    /// # Panics
    /// If the identifier is not live.
    #[inline]
    pub fn children(&self, id: I) -> &[I] {
        assert!(self.is_valid(id), "invalid entity {id:?}");
        &self.slots[id.index()].children
    }

    /// Whether `ancestor` appears anywhere on the parent chain above `id`.
    ///
    /// # Panics
    /// If either identifier is not live.
    pub fn is_child_of(&self, id: I, ancestor: I) -> bool {
        assert!(self.is_valid(id), "invalid entity {id:?}");
        assert!(self.is_valid(ancestor), "invalid entity {ancestor:?}");
        let mut current = self.slots[id.index()].parent;
        while !current.is_null() {
            debug_assert!(self.is_valid(current));
            if current == ancestor {
                return true;
            }
            current = self.slots[current.index()].parent;
        }
        false
    }

    /// Append `child` to `parent`'s children and set its parent link.
    ///
    /// # Panics
    /// If either identifier is not live, if `parent == child`, if `child`
    /// already has a parent, or if the link would create a cycle.
    pub fn add_child(&mut self, parent: I, child: I) {
        assert!(self.is_valid(parent), "invalid entity {parent:?}");
        assert!(self.is_valid(child), "invalid entity {child:?}");
        assert!(parent != child, "cannot make {child:?} a child of itself");
        assert!(
            self.slots[child.index()].parent.is_null(),
            "{child:?} already has a parent"
        );
        assert!(
            !self.is_child_of(parent, child),
            "linking {child:?} under {parent:?} would create a cycle"
        );
        self.slots[parent.index()].children.push(child);
        self.slots[child.index()].parent = parent;
    }

    /// Remove `child` from `parent`'s children and clear its parent link.
    ///
    /// # Panics
    /// If either identifier is not live, or if `child` is not currently a
    /// child of `parent`.
    pub fn remove_child(&mut self, parent: I, child: I) {
        assert!(self.is_valid(parent), "invalid entity {parent:?}");
        assert!(self.is_valid(child), "invalid entity {child:?}");
        let children = &mut self.slots[parent.index()].children;
        let position = children
            .iter()
            .position(|&candidate| candidate == child)
            .unwrap_or_else(|| panic!("{child:?} is not a child of {parent:?}"));
        children.remove(position);
        self.slots[child.index()].parent = I::NULL;
    }

    /// Re-parent `id` under `parent`, or unlink it when `parent` is null.
    ///
    /// Any existing link is removed first, so the symmetry between parent
    /// fields and children lists is preserved across the move.
    ///
    /// # Panics
    /// As [`add_child`](Self::add_child), except that `id` having a current
    /// parent is expected rather than an error.
    pub fn set_parent(&mut self, id: I, parent: I) {
        assert!(self.is_valid(id), "invalid entity {id:?}");
        self.unlink_from_parent(id);
        if !parent.is_null() {
            self.add_child(parent, id);
        }
    }

    /// Remove `id` from its parent's children, if it has a parent.
    pub(crate) fn unlink_from_parent(&mut self, id: I) {
        let parent = self.parent(id);
        if !parent.is_null() {
            self.remove_child(parent, id);
        }
    }

    /// Detach every child of `id`, leaving the children as roots.
    pub(crate) fn detach_children(&mut self, id: I) {
        assert!(self.is_valid(id), "invalid entity {id:?}");
        let children = std::mem::take(&mut self.slots[id.index()].children);
        for child in children {
            self.slots[child.index()].parent = I::NULL;
        }
    }
}

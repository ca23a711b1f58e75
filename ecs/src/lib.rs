//! A sparse-set entity-component registry with generational identifiers.
//!
//! This crate is the in-memory core of an ECS runtime: a [`Registry`] owns a
//! set of entities, attaches arbitrary `'static` component values to them,
//! and iterates entities holding several component types at once without
//! touching the ones that don't.
//!
//! # Architecture
//!
//! - **[`entity`]**: packed index+generation identifiers ([`Id32`],
//!   [`Id64`]) and the slot table with free-list recycling and parent/child
//!   links.
//! - **[`storage`]**: the [`SparseSet`](storage::SparseSet) primitive and
//!   the typed [`Store`](storage::Store) built on it.
//! - **[`registry`]**: the [`Registry`] façade routing every operation, plus
//!   the per-registry dense type-id map.
//! - **[`system`]**: optional per-component-type lifecycle callbacks.
//! - **[`view`]**: joined iteration across stores, driven by the smallest.
//!
//! # Example
//!
//! ```
//! use sparse_ecs::{Id64, Registry, System};
//!
//! struct Position { x: f32 }
//! struct Velocity { dx: f32 }
//!
//! let mut registry = Registry::<Id64>::new();
//! registry.register_system(System::new().on_update(|position: &mut Position| {
//!     position.x = position.x.clamp(-100.0, 100.0);
//! }));
//!
//! let entity = registry.create_entity();
//! registry.add(entity, Position { x: 0.0 });
//! registry.add(entity, Velocity { dx: 3.0 });
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, (position, velocity)| {
//!     position.x += velocity.dx;
//! });
//! registry.run_update::<Position>();
//!
//! assert_eq!(registry.get::<Position>(entity).x, 3.0);
//! ```
//!
//! # Threading
//!
//! The core is single-threaded: all operations are synchronous methods, and
//! user callbacks run on the caller's stack. Nothing here spawns, schedules,
//! or serializes.

pub mod entity;
pub mod registry;
pub mod storage;
pub mod system;
pub mod view;

pub use entity::{EntityTable, Id32, Id64, Identifier};
pub use registry::{Registry, TypeId, TypeRegistry};
pub use storage::{SparseKey, SparseSet, Store};
pub use system::System;
pub use view::{Fetch, View};

//! Component storage primitives.
//!
//! Storage is layered: [`SparseSet`] is the raw dense↔sparse key map, and
//! [`Store<T>`] adds the parallel value array plus lifecycle-callback
//! dispatch on top of it. The registry owns one store per component type,
//! behind the crate-internal `AnyStore` erasure.

mod sparse;
mod store;

pub use sparse::{SparseKey, SparseSet};
pub use store::Store;

pub(crate) use store::AnyStore;

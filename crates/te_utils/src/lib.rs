//! Shared containers for the typing engine crates.
//!
//! - [`hash`]: `hashbrown` containers with a fixed `foldhash` seed.
//! - [`collections::OrderedMap`]: a map that remembers insertion order.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId).

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod collections;
pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;

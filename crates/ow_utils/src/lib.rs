//! Small containers shared by the `ow` crates.
//!
//! - [`hash`]: `hashbrown` containers with a fixed `foldhash` seed, and a
//!   pass-through hasher for keys that are already hashes.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId), used by the
//!   metadata cache and the container-handler cache.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;

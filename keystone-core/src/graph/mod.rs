//! Dependency Graph
//!
//! This module implements the data structures that track relationships
//! between object properties.
//!
//! # Overview
//!
//! The graph is a set of objects, each holding named properties, where:
//!
//! - Nodes are `(object, property)` pairs, addressed by [`PropertyKey`]
//! - Edges run from a property to each computed property that reads it
//!
//! A computed property that depends on `child.name` has two incoming edges:
//! one from its own object's `child` property and one from `name` on the
//! object `child` currently refers to.
//!
//! # Design Decisions
//!
//! 1. Objects live in an arena and refer to each other by [`ObjectId`]
//!    handles, so cross-object key-paths never need shared ownership.
//!
//! 2. Forward edges live on the computed property and reverse edges on the
//!    source object. Both halves are added and removed together.
//!
//! 3. Edges are only held by clean computed properties. Invalidation tears
//!    them down and the next read rebuilds them against the current chain.

mod arena;
mod keypath;
mod object;
mod property;

pub use arena::ObjectArena;
pub use keypath::{expand_braces, KeyPath, Segments};
pub use object::{Object, ObjectId, PropertyKey};
pub use property::{CacheState, ComputedProperty, Getter, Property, Setter};

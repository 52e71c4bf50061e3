//! Keystone Core
//!
//! This crate provides a dependency-tracked property engine: objects with
//! stored and computed properties, where writing a value lazily invalidates
//! everything derived from it, across object references.
//! It implements:
//!
//! - Stored and computed property descriptors
//! - Cross-object key-path dependencies (`child.name`)
//! - Breadth-first invalidation with cycle protection
//! - Observer notification for an external rendering layer
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Objects, property descriptors, key-paths and the invalidation walk
//! - `reactive`: The runtime API, computed declarations and observers
//! - `config`: Runtime configuration
//!
//! # Example
//!
//! ```rust
//! use keystone_core::{Computed, Runtime, Value};
//!
//! let mut rt = Runtime::new();
//!
//! let child = rt.create_object_with([("childProp", "old-value")]);
//! let parent = rt.create_object_with([("childView", child)]);
//! rt.define_computed(
//!     parent,
//!     "parentProp",
//!     Computed::new(["childView.childProp"], |deps| deps[0].clone()),
//! )
//! .unwrap();
//!
//! assert_eq!(rt.get(parent, "parentProp"), Value::from("old-value"));
//!
//! // Writing the child invalidates the parent
//! rt.set(child, "childProp", "new-value").unwrap();
//! assert_eq!(rt.get(parent, "parentProp"), Value::from("new-value"));
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use graph::{ObjectId, PropertyKey};
pub use reactive::{Computed, ObserverId, Runtime};
pub use value::Value;

//! Error types for the property graph.

use thiserror::Error;

use crate::graph::ObjectId;

/// Errors produced by [`Runtime`](crate::reactive::Runtime) operations.
///
/// Reads never fail: unknown objects, undeclared properties and unresolvable
/// key-paths all read as [`Value::Undefined`](crate::Value::Undefined).
/// Only writes, definitions and configuration can return an error.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A write targeted a computed property that has no setter.
    #[error("cannot set read-only computed property `{name}` on {object}")]
    ImmutableProperty { object: ObjectId, name: String },

    /// The object handle does not refer to a live object.
    #[error("object {0} does not exist or has been destroyed")]
    UnknownObject(ObjectId),

    #[error("invalid key path `{path}`: {reason}")]
    InvalidKeyPath { path: String, reason: &'static str },

    /// An intermediate segment of a path write did not hold an object.
    #[error("cannot set `{path}`: segment `{segment}` does not refer to an object")]
    UnresolvedPath { path: String, segment: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

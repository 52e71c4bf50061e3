//! Graph Objects
//!
//! This module defines the objects that live in the dependency graph and the
//! keys used to address their properties.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::property::Property;

/// Stable handle to an object in a runtime's arena.
///
/// Handles are allocated from a per-runtime counter and are never reused,
/// so a handle to a destroyed object simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single property of a single object.
///
/// This is the unit of everything the graph tracks: dependency edges,
/// observer subscriptions, and invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub object: ObjectId,
    pub name: String,
}

impl PropertyKey {
    pub fn new(object: ObjectId, name: impl Into<String>) -> Self {
        Self {
            object,
            name: name.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.name)
    }
}

/// An object in the dependency graph.
///
/// Each object owns its property descriptors and the reverse edges pointing
/// at computed properties (on this or any other object) that read one of
/// its properties.
#[derive(Debug)]
pub struct Object {
    /// Unique identifier for this object.
    id: ObjectId,

    /// Property descriptors, in definition order.
    properties: IndexMap<String, Property>,

    /// Reverse edges: property name to the computed properties that depend
    /// on it. A name may have dependents before it is ever declared, since
    /// reading an undeclared property still registers the edge.
    dependents: IndexMap<String, IndexSet<PropertyKey>>,
}

impl Object {
    /// Create a new empty object.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            properties: IndexMap::new(),
            dependents: IndexMap::new(),
        }
    }

    /// Get the object's ID.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Install a descriptor, returning the one it replaced.
    pub fn insert_property(
        &mut self,
        name: impl Into<String>,
        property: Property,
    ) -> Option<Property> {
        self.properties.insert(name.into(), property)
    }

    /// Iterate over descriptors in definition order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    /// Record that `dependent` reads property `name` of this object.
    ///
    /// Returns `true` if the edge is new.
    pub fn add_dependent(&mut self, name: &str, dependent: PropertyKey) -> bool {
        match self.dependents.get_mut(name) {
            Some(set) => set.insert(dependent),
            None => {
                let mut set = IndexSet::new();
                set.insert(dependent);
                self.dependents.insert(name.to_owned(), set);
                true
            }
        }
    }

    /// Remove a reverse edge.
    pub fn remove_dependent(&mut self, name: &str, dependent: &PropertyKey) {
        if let Some(set) = self.dependents.get_mut(name) {
            set.shift_remove(dependent);
            if set.is_empty() {
                self.dependents.shift_remove(name);
            }
        }
    }

    /// Get the dependents of a property, in registration order.
    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &PropertyKey> {
        self.dependents.get(name).into_iter().flatten()
    }

    /// Iterate over every reverse edge as `(property name, dependent)`.
    pub fn all_dependents(&self) -> impl Iterator<Item = (&str, &PropertyKey)> {
        self.dependents
            .iter()
            .flat_map(|(name, set)| set.iter().map(move |dep| (name.as_str(), dep)))
    }
}

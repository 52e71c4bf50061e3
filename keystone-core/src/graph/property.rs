//! Property Descriptors
//!
//! Every property of an object is described by a [`Property`]: either a
//! stored value or a computed value derived from other properties.
//!
//! # How Computed Properties Cache
//!
//! 1. A computed property starts dirty, with no cached value and no edges.
//!
//! 2. On first read, its key-paths are resolved, which registers forward
//!    edges here and reverse edges on each source object. The getter runs and
//!    the result is cached.
//!
//! 3. While clean, reads return the cache without calling the getter.
//!
//! 4. When a source changes, the property is invalidated: the cache is
//!    dropped and every forward edge is handed back to the caller for
//!    teardown. A dirty property owns no edges.
//!
//! Dropping the edges on invalidation is what makes reference reassignment
//! work. The next read re-walks each key-path from the start, so a chain
//! like `child.name` binds to whatever `child` refers to at that moment.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::reactive::Runtime;
use crate::Value;

use super::keypath::KeyPath;
use super::object::{ObjectId, PropertyKey};

/// Derives a value from the resolved dependency values, in declaration order.
pub type Getter = Rc<dyn Fn(&[Value]) -> Value>;

/// Handles a write to a computed property.
///
/// The setter receives the runtime, the owning object and the assigned value.
/// Its return value, not the assigned value, becomes the cached result.
pub type Setter = Rc<dyn Fn(&mut Runtime, ObjectId, Value) -> Result<Value>>;

/// Cache state of a computed property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The cached value is up-to-date.
    Clean,

    /// The property must recompute on next read.
    Dirty,
}

/// A property descriptor.
pub enum Property {
    Stored(Value),
    Computed(ComputedProperty),
}

impl Property {
    pub fn is_computed(&self) -> bool {
        matches!(self, Property::Computed(_))
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Stored(value) => f.debug_tuple("Stored").field(value).finish(),
            Property::Computed(computed) => f.debug_tuple("Computed").field(computed).finish(),
        }
    }
}

/// A derived property with declared dependency key-paths.
pub struct ComputedProperty {
    dependencies: Vec<KeyPath>,
    getter: Getter,
    setter: Option<Setter>,

    /// The cached value. `None` means dirty.
    cache: Option<Value>,

    /// Forward edges registered during the last resolution.
    sources: HashSet<PropertyKey>,
}

impl ComputedProperty {
    /// Create a new, dirty computed property.
    pub fn new(dependencies: Vec<KeyPath>, getter: Getter, setter: Option<Setter>) -> Self {
        Self {
            dependencies,
            getter,
            setter,
            cache: None,
            sources: HashSet::new(),
        }
    }

    pub fn dependencies(&self) -> &[KeyPath] {
        &self.dependencies
    }

    pub fn getter(&self) -> Getter {
        Rc::clone(&self.getter)
    }

    pub fn setter(&self) -> Option<Setter> {
        self.setter.clone()
    }

    pub fn state(&self) -> CacheState {
        if self.cache.is_some() {
            CacheState::Clean
        } else {
            CacheState::Dirty
        }
    }

    /// Get the cached value, if clean.
    pub fn cached(&self) -> Option<&Value> {
        self.cache.as_ref()
    }

    /// Store a freshly computed value and mark the property clean.
    ///
    /// Returns `true` if the value differs from the previous cache, or if
    /// there was no valid cache.
    pub fn store(&mut self, value: Value) -> bool {
        let changed = self.cache.as_ref() != Some(&value);
        self.cache = Some(value);
        changed
    }

    /// Record a forward edge. Returns `true` if the edge is new.
    pub fn add_source(&mut self, source: PropertyKey) -> bool {
        self.sources.insert(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &PropertyKey> {
        self.sources.iter()
    }

    /// Drop the cache and surrender all forward edges.
    ///
    /// The caller must remove the matching reverse edges from the source
    /// objects.
    pub fn invalidate(&mut self) -> HashSet<PropertyKey> {
        self.cache = None;
        std::mem::take(&mut self.sources)
    }
}

impl fmt::Debug for ComputedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedProperty")
            .field("dependencies", &self.dependencies)
            .field("has_setter", &self.setter.is_some())
            .field("state", &self.state())
            .field("source_count", &self.sources.len())
            .finish()
    }
}

//! Reactive Runtime
//!
//! The runtime is the public face of the engine. It owns the object arena and
//! the observer registry, and implements `get`/`set` on top of them.
//!
//! # How It Works
//!
//! 1. Objects are created in the runtime and given stored or computed
//!    properties.
//!
//! 2. Reading a dirty computed property resolves each of its key-paths one
//!    segment at a time. Every segment read registers an edge, so the
//!    property depends on the intermediate references as well as the leaf.
//!
//! 3. Writing a property that actually changes:
//!    a. Invalidates every transitive dependent (breadth-first)
//!    b. Notifies observers of the written property
//!    c. Notifies observers of each invalidated property, in walk order
//!    d. Recomputation waits until somebody reads
//!
//! # Threading
//!
//! The runtime is single-threaded. Getters, setters and observer callbacks
//! are reference counted with `Rc`, so a runtime cannot leave its thread.

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{
    expand_braces, CacheState, ComputedProperty, KeyPath, ObjectArena, ObjectId, Property,
    PropertyKey, Setter,
};
use crate::Value;

use super::computed::Computed;
use super::context::{EvaluationContext, RuntimeId};
use super::observer::{Observer, ObserverId, ObserverRegistry};

/// A graph of objects with stored and computed properties.
pub struct Runtime {
    id: RuntimeId,
    config: GraphConfig,
    arena: ObjectArena,
    observers: ObserverRegistry,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::build(GraphConfig::default())
    }

    /// Create a runtime with a validated configuration.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GraphConfig) -> Self {
        Self {
            id: RuntimeId::new(),
            config,
            arena: ObjectArena::new(),
            observers: ObserverRegistry::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------------

    /// Allocate a new object with no properties.
    pub fn create_object(&mut self) -> ObjectId {
        let id = self.arena.allocate();
        debug!(object = %id, "created object");
        id
    }

    /// Allocate a new object with initial stored properties.
    pub fn create_object_with<I, K, V>(&mut self, properties: I) -> ObjectId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let id = self.create_object();
        if let Some(object) = self.arena.get_mut(id) {
            for (name, value) in properties {
                object.insert_property(name, Property::Stored(value.into()));
            }
        }
        id
    }

    /// Check if `object` refers to a live object.
    pub fn contains(&self, object: ObjectId) -> bool {
        self.arena.contains(object)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.arena.len()
    }

    /// Destroy an object.
    ///
    /// Its descriptors, edges and observers are dropped. Computed properties
    /// on other objects that read through it are invalidated and their
    /// observers notified; on the next read they see `Undefined` where this
    /// object's properties used to be.
    pub fn destroy(&mut self, object: ObjectId) -> Result<()> {
        let removed = self
            .arena
            .remove(object)
            .ok_or(GraphError::UnknownObject(object))?;
        self.observers.remove_object(object);

        let orphaned: IndexSet<PropertyKey> = removed
            .all_dependents()
            .map(|(_, dependent)| dependent)
            .filter(|dependent| dependent.object != object)
            .cloned()
            .collect();

        let invalidated = self
            .arena
            .invalidate(orphaned.into_iter().collect(), HashSet::new());
        debug!(object = %object, invalidated = invalidated.len(), "destroyed object");

        for key in &invalidated {
            self.dispatch(key);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------------

    /// Declare a stored property.
    ///
    /// Redefining an existing property replaces it and counts as a change.
    pub fn define_stored(
        &mut self,
        object: ObjectId,
        name: &str,
        initial: impl Into<Value>,
    ) -> Result<()> {
        self.install(object, name, Property::Stored(initial.into()))
    }

    /// Declare a computed property.
    ///
    /// Dependency patterns are parsed now but not resolved: objects along a
    /// key-path may not exist yet. Resolution happens on first read.
    pub fn define_computed(
        &mut self,
        object: ObjectId,
        name: &str,
        computed: Computed,
    ) -> Result<()> {
        let mut paths = Vec::with_capacity(computed.dependencies.len());
        for pattern in &computed.dependencies {
            let expanded = if self.config.brace_expansion {
                expand_braces(pattern)?
            } else {
                vec![pattern.clone()]
            };
            for path in expanded {
                paths.push(KeyPath::parse(&path, self.config.max_key_path_depth)?);
            }
        }

        let property = ComputedProperty::new(paths, computed.getter, computed.setter);
        self.install(object, name, Property::Computed(property))
    }

    fn install(&mut self, object: ObjectId, name: &str, property: Property) -> Result<()> {
        let key = PropertyKey::new(object, name);
        let is_computed = property.is_computed();
        let replaced = self
            .arena
            .get_mut(object)
            .ok_or(GraphError::UnknownObject(object))?
            .insert_property(name, property);

        if let Some(Property::Computed(old)) = &replaced {
            self.arena.detach(&key, old.sources());
        }
        debug!(
            property = %key,
            computed = is_computed,
            redefined = replaced.is_some(),
            "defined property"
        );

        self.property_did_change(&key);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Read a property.
    ///
    /// Stored properties return their value. Computed properties return
    /// their cache when clean and recompute otherwise. Unknown objects and
    /// undeclared properties read as `Undefined`.
    pub fn get(&mut self, object: ObjectId, name: &str) -> Value {
        let Some(obj) = self.arena.get(object) else {
            return Value::Undefined;
        };

        let cached = match obj.property(name) {
            None => return Value::Undefined,
            Some(Property::Stored(value)) => return value.clone(),
            Some(Property::Computed(computed)) => computed.cached().cloned(),
        };

        match cached {
            Some(value) => value,
            None => self.recompute(&PropertyKey::new(object, name)),
        }
    }

    fn recompute(&mut self, key: &PropertyKey) -> Value {
        let Some(_ctx) = EvaluationContext::enter(self.id, key) else {
            warn!(property = %key, "cyclic dependency, reading as undefined");
            return Value::Undefined;
        };

        let Some(computed) = self.arena.computed(key) else {
            return Value::Undefined;
        };
        let paths = computed.dependencies().to_vec();
        let getter = computed.getter();

        let args: Vec<Value> = paths.iter().map(|path| self.resolve(key, path)).collect();
        let value = getter(&args);

        if let Some(computed) = self.arena.computed_mut(key) {
            computed.store(value.clone());
        }
        trace!(property = %key, depth = EvaluationContext::depth(), "recomputed");
        value
    }

    /// Resolve one dependency key-path of `dependent`, registering an edge
    /// for every segment visited.
    fn resolve(&mut self, dependent: &PropertyKey, path: &KeyPath) -> Value {
        let mut object = dependent.object;
        let last = path.len() - 1;

        for (depth, segment) in path.segments().iter().enumerate() {
            let source = PropertyKey::new(object, segment.as_str());
            if self.arena.link(&source, dependent) {
                trace!(source = %source, dependent = %dependent, "registered edge");
            }

            let value = self.get(object, segment);
            if depth == last {
                return value;
            }
            match value.as_object() {
                Some(next) => object = next,
                None => return Value::Undefined,
            }
        }

        Value::Undefined
    }

    /// Read through a dot-separated path without registering dependencies.
    pub fn get_path(&mut self, object: ObjectId, path: &str) -> Value {
        let mut current = object;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let value = self.get(current, segment);
            if segments.peek().is_none() {
                return value;
            }
            match value.as_object() {
                Some(next) => current = next,
                None => return Value::Undefined,
            }
        }

        Value::Undefined
    }

    /// Read several properties at once.
    pub fn get_properties<I, S>(&mut self, object: ObjectId, names: I) -> IndexMap<String, Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_owned(), self.get(object, name))
            })
            .collect()
    }

    /// Read every declared property of an object, in definition order.
    pub fn snapshot(&mut self, object: ObjectId) -> Result<IndexMap<String, Value>> {
        let names: Vec<String> = self
            .arena
            .get(object)
            .ok_or(GraphError::UnknownObject(object))?
            .properties()
            .map(|(name, _)| name.to_owned())
            .collect();
        Ok(self.get_properties(object, names))
    }

    /// Render [`snapshot`](Self::snapshot) as JSON.
    pub fn snapshot_json(&mut self, object: ObjectId) -> Result<serde_json::Value> {
        let snapshot = self.snapshot(object)?;
        Ok(serde_json::to_value(snapshot)?)
    }

    /// Get the cached value of a clean computed property without computing.
    pub fn cache_for(&self, object: ObjectId, name: &str) -> Option<Value> {
        self.arena
            .computed(&PropertyKey::new(object, name))?
            .cached()
            .cloned()
    }

    pub fn is_computed(&self, object: ObjectId, name: &str) -> bool {
        self.arena.computed(&PropertyKey::new(object, name)).is_some()
    }

    /// Check if a computed property needs to recompute on next read.
    pub fn is_dirty(&self, object: ObjectId, name: &str) -> bool {
        self.arena
            .computed(&PropertyKey::new(object, name))
            .is_some_and(|computed| computed.state() == CacheState::Dirty)
    }

    /// Get the computed properties currently registered as reading a property.
    pub fn dependents_of(&self, object: ObjectId, name: &str) -> Vec<PropertyKey> {
        self.arena.dependents_of(&PropertyKey::new(object, name))
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Write a property.
    ///
    /// Writing an undeclared name declares it as a stored property. Stored
    /// writes that do not change the value are ignored. Computed properties
    /// delegate to their setter, and fail with
    /// [`GraphError::ImmutableProperty`] if they have none.
    pub fn set(&mut self, object: ObjectId, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let key = PropertyKey::new(object, name);

        let obj = self
            .arena
            .get_mut(object)
            .ok_or(GraphError::UnknownObject(object))?;
        if !obj.has_property(name) {
            obj.insert_property(name, Property::Stored(Value::Undefined));
        }

        match obj.property_mut(name) {
            Some(Property::Stored(current)) => {
                if *current == value {
                    trace!(property = %key, "value unchanged");
                    return Ok(());
                }
                *current = value;
            }
            Some(Property::Computed(computed)) => {
                let setter = computed.setter().ok_or_else(|| GraphError::ImmutableProperty {
                    object,
                    name: name.to_owned(),
                })?;
                return self.set_computed(&key, setter, value);
            }
            None => return Ok(()),
        }

        self.property_did_change(&key);
        Ok(())
    }

    fn set_computed(&mut self, key: &PropertyKey, setter: Setter, value: Value) -> Result<()> {
        let was_clean = !self.is_dirty(key.object, &key.name);
        let result = setter(self, key.object, value)?;

        // The setter may have destroyed or redefined the property.
        let Some(computed) = self.arena.computed(key) else {
            return Ok(());
        };

        // A setter that writes one of the property's own dependencies has
        // already invalidated it, its dependents and their observers.
        let already_propagated = was_clean && computed.state() == CacheState::Dirty;

        let paths = computed.dependencies().to_vec();
        for path in &paths {
            self.resolve(key, path);
        }

        let changed = self
            .arena
            .computed_mut(key)
            .is_some_and(|computed| computed.store(result));
        if already_propagated {
            trace!(property = %key, "setter invalidated its own property");
        } else if changed {
            self.property_did_change(key);
        } else {
            trace!(property = %key, "setter result unchanged");
        }
        Ok(())
    }

    /// Write through a dot-separated path.
    ///
    /// Every segment but the last must resolve to an object.
    pub fn set_path(
        &mut self,
        object: ObjectId,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let path = KeyPath::parse(path, self.config.max_key_path_depth)?;
        let intermediates = &path.segments()[..path.len() - 1];

        let mut target = object;
        for segment in intermediates {
            target = self
                .get(target, segment)
                .as_object()
                .ok_or_else(|| GraphError::UnresolvedPath {
                    path: path.to_string(),
                    segment: segment.clone(),
                })?;
        }

        self.set(target, path.leaf(), value)
    }

    /// Write several properties, stopping at the first error.
    pub fn set_properties<I, K, V>(&mut self, object: ObjectId, properties: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in properties {
            self.set(object, name.as_ref(), value)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------------

    /// Register a callback fired whenever the property is written or
    /// invalidated.
    pub fn observe<F>(&mut self, object: ObjectId, name: &str, callback: F) -> Result<ObserverId>
    where
        F: Fn(&PropertyKey) + 'static,
    {
        if !self.arena.contains(object) {
            return Err(GraphError::UnknownObject(object));
        }
        Ok(self
            .observers
            .add(PropertyKey::new(object, name), Observer::new(callback)))
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Treat a property as changed without writing it.
    ///
    /// A computed property is invalidated along with its dependents.
    pub fn notify_property_change(&mut self, object: ObjectId, name: &str) -> Result<()> {
        if !self.arena.contains(object) {
            return Err(GraphError::UnknownObject(object));
        }

        let key = PropertyKey::new(object, name);
        let invalidated = self.arena.invalidate(vec![key], HashSet::new());
        for key in &invalidated {
            self.dispatch(key);
        }
        Ok(())
    }

    /// Invalidate the dependents of `key` and notify everyone affected.
    fn property_did_change(&mut self, key: &PropertyKey) {
        let invalidated = self.arena.propagate(key);
        if !invalidated.is_empty() {
            debug!(property = %key, invalidated = invalidated.len(), "propagated change");
        }

        self.dispatch(key);
        for dependent in &invalidated {
            self.dispatch(dependent);
        }
    }

    fn dispatch(&self, key: &PropertyKey) {
        for observer in self.observers.observers(key) {
            observer.notify(key);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("object_count", &self.arena.len())
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

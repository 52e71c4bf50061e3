//! Object Arena
//!
//! The arena owns every object in a runtime, keeps forward and reverse edges
//! symmetric, and performs the invalidation walk.
//!
//! # Algorithm
//!
//! When a property changes, we walk reverse edges breadth-first:
//!
//! 1. Start with the direct dependents of the changed property
//! 2. For each dependent not yet visited:
//!    - Drop its cached value (it will recompute lazily on next read)
//!    - Tear down its forward edges, removing the matching reverse edges
//!    - Queue its own dependents
//! 3. Return the visited dependents in walk order, for notification
//!
//! The visited set makes the walk terminate on cyclic graphs.

use std::collections::{HashMap, HashSet, VecDeque};

use super::object::{Object, ObjectId, PropertyKey};
use super::property::{ComputedProperty, Property};

/// Arena of objects addressed by [`ObjectId`].
#[derive(Debug, Default)]
pub struct ObjectArena {
    /// All live objects, indexed by ID.
    objects: HashMap<ObjectId, Object>,

    /// Next ID to hand out. IDs are never reused.
    next_id: u64,
}

impl ObjectArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new empty object.
    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId::from(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, Object::new(id));
        id
    }

    /// Remove an object from the arena.
    ///
    /// Also removes the reverse edges its computed properties registered on
    /// other objects. Reverse edges pointing *into* the removed object's
    /// dependents are returned to the caller, which decides how to invalidate
    /// them.
    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        let object = self.objects.remove(&id)?;

        for (name, property) in object.properties() {
            if let Property::Computed(computed) = property {
                self.detach(&PropertyKey::new(object.id(), name), computed.sources());
            }
        }

        Some(object)
    }

    /// Remove the reverse edges from `sources` to `dependent`.
    ///
    /// Sources on objects that no longer exist are skipped.
    pub fn detach<'a>(
        &mut self,
        dependent: &PropertyKey,
        sources: impl IntoIterator<Item = &'a PropertyKey>,
    ) {
        for source in sources {
            if let Some(source_object) = self.objects.get_mut(&source.object) {
                source_object.remove_dependent(&source.name, dependent);
            }
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Get the computed descriptor at `key`, if there is one.
    pub fn computed(&self, key: &PropertyKey) -> Option<&ComputedProperty> {
        match self.objects.get(&key.object)?.property(&key.name)? {
            Property::Computed(computed) => Some(computed),
            Property::Stored(_) => None,
        }
    }

    pub fn computed_mut(&mut self, key: &PropertyKey) -> Option<&mut ComputedProperty> {
        match self.objects.get_mut(&key.object)?.property_mut(&key.name)? {
            Property::Computed(computed) => Some(computed),
            Property::Stored(_) => None,
        }
    }

    /// Add an edge: `dependent` reads `source`.
    ///
    /// Both halves are recorded, or neither: if the source object is gone or
    /// the dependent is not a computed property, nothing changes.
    pub fn link(&mut self, source: &PropertyKey, dependent: &PropertyKey) -> bool {
        if !self.contains(source.object) {
            return false;
        }
        let Some(computed) = self.computed_mut(dependent) else {
            return false;
        };
        let added = computed.add_source(source.clone());

        if let Some(source_object) = self.objects.get_mut(&source.object) {
            source_object.add_dependent(&source.name, dependent.clone());
        }
        added
    }

    /// Snapshot the dependents of a property.
    pub fn dependents_of(&self, key: &PropertyKey) -> Vec<PropertyKey> {
        self.objects
            .get(&key.object)
            .map(|object| object.dependents(&key.name).cloned().collect())
            .unwrap_or_default()
    }

    /// Invalidate everything downstream of a changed property.
    ///
    /// Returns the invalidated keys in breadth-first order. The origin itself
    /// is not included and is not invalidated.
    pub fn propagate(&mut self, origin: &PropertyKey) -> Vec<PropertyKey> {
        let seeds = self.dependents_of(origin);
        let mut visited = HashSet::new();
        visited.insert(origin.clone());
        self.invalidate(seeds, visited)
    }

    /// Invalidate `seeds` and everything downstream of them.
    ///
    /// Keys already in `visited` are skipped.
    pub fn invalidate(
        &mut self,
        seeds: Vec<PropertyKey>,
        mut visited: HashSet<PropertyKey>,
    ) -> Vec<PropertyKey> {
        let mut invalidated = Vec::new();
        let mut queue: VecDeque<PropertyKey> = seeds.into();

        while let Some(key) = queue.pop_front() {
            if !visited.insert(key.clone()) {
                continue;
            }

            // Snapshot before teardown: a self-referencing property would
            // otherwise lose its own edge before we follow it.
            queue.extend(self.dependents_of(&key));

            let sources = self
                .computed_mut(&key)
                .map(ComputedProperty::invalidate)
                .unwrap_or_default();
            self.detach(&key, &sources);

            invalidated.push(key);
        }

        invalidated
    }

    /// Get the total number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

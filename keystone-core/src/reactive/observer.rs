//! Observers
//!
//! An observer is a callback attached to one property. It fires when that
//! property is written or invalidated. A rendering layer typically observes
//! the properties its bindings read and schedules a re-render on
//! notification, pulling fresh values with `get` afterwards.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::{ObjectId, PropertyKey};

/// Unique identifier for an observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Generate a new unique observer ID.
    ///
    /// Uses an atomic counter so IDs stay unique across runtimes.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback invoked with the key that changed.
pub type Callback = Rc<dyn Fn(&PropertyKey)>;

/// A registered observer.
pub struct Observer {
    id: ObserverId,
    callback: Callback,
}

impl Observer {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&PropertyKey) + 'static,
    {
        Self {
            id: ObserverId::new(),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Notify the observer that `key` changed.
    pub fn notify(&self, key: &PropertyKey) {
        (self.callback)(key);
    }
}

/// Observers indexed by the property they watch.
#[derive(Default)]
pub struct ObserverRegistry {
    by_key: HashMap<PropertyKey, Vec<Observer>>,
    keys: HashMap<ObserverId, PropertyKey>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: PropertyKey, observer: Observer) -> ObserverId {
        let id = observer.id();
        self.keys.insert(id, key.clone());
        self.by_key.entry(key).or_default().push(observer);
        id
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let Some(key) = self.keys.remove(&id) else {
            return false;
        };
        if let Some(observers) = self.by_key.get_mut(&key) {
            observers.retain(|o| o.id() != id);
            if observers.is_empty() {
                self.by_key.remove(&key);
            }
        }
        true
    }

    /// Drop every observer attached to a property of `object`.
    pub fn remove_object(&mut self, object: ObjectId) {
        self.by_key.retain(|key, _| key.object != object);
        self.keys.retain(|_, key| key.object != object);
    }

    /// Get the observers watching `key`, in registration order.
    pub fn observers(&self, key: &PropertyKey) -> &[Observer] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

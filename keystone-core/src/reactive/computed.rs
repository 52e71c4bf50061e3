//! Computed Property Declarations
//!
//! [`Computed`] describes a derived property before it is installed on an
//! object: its dependency key-paths, its getter, and an optional setter.
//!
//! ```rust
//! use keystone_core::{Computed, Runtime, Value};
//!
//! let mut rt = Runtime::new();
//! let person = rt.create_object_with([("first", "Ada"), ("last", "Lovelace")]);
//!
//! rt.define_computed(
//!     person,
//!     "full",
//!     Computed::new(["first", "last"], |deps| {
//!         Value::from(format!("{} {}", deps[0], deps[1]))
//!     }),
//! )
//! .unwrap();
//!
//! assert_eq!(rt.get(person, "full"), Value::from("Ada Lovelace"));
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::graph::{Getter, ObjectId, Setter};
use crate::Value;

use super::runtime::Runtime;

/// Declaration of a computed property.
pub struct Computed {
    pub(crate) dependencies: Vec<String>,
    pub(crate) getter: Getter,
    pub(crate) setter: Option<Setter>,
}

impl Computed {
    /// Declare a read-only computed property.
    ///
    /// The getter receives the resolved value of each dependency pattern in
    /// declaration order. A brace pattern contributes one value per expanded
    /// path.
    pub fn new<I, S, F>(dependencies: I, getter: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            getter: Rc::new(getter),
            setter: None,
        }
    }

    /// Make the property writable.
    ///
    /// Whatever the setter returns becomes the cached value, which lets a
    /// setter refuse or rewrite the assigned value.
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut Runtime, ObjectId, Value) -> Result<Value> + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    /// A computed property that mirrors another path, read and write.
    pub fn alias(path: impl Into<String>) -> Self {
        let path = path.into();
        let target = path.clone();
        Self::new([path], |deps| deps[0].clone()).with_setter(move |rt, object, value| {
            rt.set_path(object, &target, value.clone())?;
            Ok(value)
        })
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("dependencies", &self.dependencies)
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}

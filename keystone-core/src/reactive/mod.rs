//! Reactive Runtime
//!
//! This module exposes the engine: the [`Runtime`] that reads and writes
//! properties, the [`Computed`] declarations it installs, and the observers
//! it notifies.
//!
//! # Concepts
//!
//! ## Stored properties
//!
//! A stored property holds a value directly. Writing a different value
//! invalidates everything that depends on it.
//!
//! ## Computed properties
//!
//! A computed property derives its value from declared key-paths. It is
//! lazy: invalidation only marks it dirty, and the getter runs again on the
//! next read.
//!
//! ## Observers
//!
//! An observer is a callback attached to one property, fired whenever that
//! property is written or invalidated. Observers are how a rendering layer
//! learns that it has to pull fresh values.
//!
//! # Implementation Notes
//!
//! Dependencies are declared, not discovered. A getter receives the values
//! of its key-paths as arguments and cannot read anything else, so the
//! declared list is always the complete set of edges.

mod computed;
mod context;
mod observer;
mod runtime;

pub use computed::Computed;
pub use context::{EvaluationContext, RuntimeId};
pub use observer::{Callback, Observer, ObserverId, ObserverRegistry};
pub use runtime::Runtime;

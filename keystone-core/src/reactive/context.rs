//! Evaluation Context
//!
//! The evaluation context tracks which computed properties are currently
//! running their getters. Resolving a dependency can recompute another
//! computed property, so evaluations nest; a property that shows up twice
//! in the stack has a cyclic dependency.
//!
//! # Implementation
//!
//! We use a thread-local stack. When a computed property starts resolving
//! its dependencies we push its key, and the returned guard pops it when
//! dropped. Entries carry the owning runtime's ID so that two runtimes on
//! the same thread never see each other's keys.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::PropertyKey;

thread_local! {
    static EVALUATION_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// Unique identifier for a runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl RuntimeId {
    /// Generate a new unique runtime ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct ContextEntry {
    runtime: RuntimeId,
    key: PropertyKey,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if a getter panics.
pub struct EvaluationContext {
    runtime: RuntimeId,
    key: PropertyKey,
}

impl EvaluationContext {
    /// Enter the evaluation of `key`.
    ///
    /// Returns `None` if `key` is already being evaluated, which means the
    /// caller has hit a dependency cycle.
    pub fn enter(runtime: RuntimeId, key: &PropertyKey) -> Option<Self> {
        if Self::is_evaluating(runtime, key) {
            return None;
        }

        EVALUATION_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                runtime,
                key: key.clone(),
            });
        });

        Some(Self {
            runtime,
            key: key.clone(),
        })
    }

    /// Check if `key` is anywhere in the current evaluation stack.
    pub fn is_evaluating(runtime: RuntimeId, key: &PropertyKey) -> bool {
        EVALUATION_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| entry.runtime == runtime && entry.key == *key)
        })
    }

    /// Number of nested evaluations currently running on this thread.
    pub fn depth() -> usize {
        EVALUATION_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for EvaluationContext {
    fn drop(&mut self) {
        EVALUATION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert!(
                    entry.runtime == self.runtime && entry.key == self.key,
                    "EvaluationContext mismatch: expected {}, got {}",
                    self.key,
                    entry.key
                );
            }
        });
    }
}

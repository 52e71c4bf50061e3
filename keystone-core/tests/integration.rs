//! Integration Tests for the Property Engine
//!
//! These tests verify that stored properties, computed properties, key-paths
//! and observers work together across objects.

use std::cell::Cell;
use std::rc::Rc;

use keystone_core::{Computed, GraphError, ObjectId, Runtime, Value};

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn bump(counter: &Rc<Cell<u32>>) -> impl Fn(&keystone_core::PropertyKey) + 'static {
    let counter = counter.clone();
    move |_: &keystone_core::PropertyKey| counter.set(counter.get() + 1)
}

/// Test that a computed property picks up a new value of its dependency.
#[test]
fn computed_reflects_dependency_change() {
    let mut rt = Runtime::new();
    let view = rt.create_object_with([("dependencyProp", "old-value")]);
    rt.define_computed(
        view,
        "childProp",
        Computed::new(["dependencyProp"], |deps| deps[0].clone()),
    )
    .unwrap();

    assert_eq!(rt.get(view, "childProp"), Value::from("old-value"));

    rt.set(view, "dependencyProp", "new-value").unwrap();
    assert_eq!(rt.get(view, "childProp"), Value::from("new-value"));
}

/// Test that invalidation is transitive across a three-level chain.
#[test]
fn invalidation_is_transitive() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("a", 1)]);
    let c_calls = counter();
    let c_calls_clone = c_calls.clone();

    rt.define_computed(
        obj,
        "b",
        Computed::new(["a"], |deps| {
            Value::from(deps[0].as_number().unwrap_or_default() * 10.0)
        }),
    )
    .unwrap();
    rt.define_computed(
        obj,
        "c",
        Computed::new(["b"], move |deps| {
            c_calls_clone.set(c_calls_clone.get() + 1);
            Value::from(deps[0].as_number().unwrap_or_default() + 1.0)
        }),
    )
    .unwrap();

    assert_eq!(rt.get(obj, "c"), Value::from(11));

    rt.set(obj, "a", 2).unwrap();
    assert!(rt.is_dirty(obj, "b"));
    assert!(rt.is_dirty(obj, "c"));
    assert_eq!(rt.get(obj, "c"), Value::from(21));
    assert_eq!(c_calls.get(), 2);
}

/// Test that repeated reads do not rerun the getter.
#[test]
fn repeated_reads_use_cache() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("a", "x")]);
    let calls = counter();
    let calls_clone = calls.clone();

    rt.define_computed(
        obj,
        "b",
        Computed::new(["a"], move |deps| {
            calls_clone.set(calls_clone.get() + 1);
            deps[0].clone()
        }),
    )
    .unwrap();

    let first = rt.get(obj, "b");
    let second = rt.get(obj, "b");
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);
}

/// Test that computed properties without a setter reject every write.
#[test]
fn read_only_computed_rejects_writes() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("a", 1)]);
    rt.define_computed(obj, "b", Computed::new(["a"], |deps| deps[0].clone()))
        .unwrap();

    for value in [Value::from(1), Value::Undefined, Value::from("x"), Value::Null] {
        let err = rt.set(obj, "b", value).unwrap_err();
        assert!(matches!(err, GraphError::ImmutableProperty { .. }));
    }
}

/// Test the parent/child view chain: a change three levels down surfaces on
/// the parent, and the parent's observer hears about it.
#[test]
fn propagates_dependent_key_invalidation_upstream() {
    let mut rt = Runtime::new();

    let child = rt.create_object_with([("dependencyProp", "old-value")]);
    rt.define_computed(
        child,
        "childProp",
        Computed::new(["dependencyProp"], |deps| deps[0].clone())
            // Ignore the assigned value and re-derive from the dependency
            .with_setter(|rt, object, _value| Ok(rt.get(object, "dependencyProp"))),
    )
    .unwrap();

    let parent = rt.create_object_with([("childView", child)]);
    rt.define_computed(
        parent,
        "parentProp",
        Computed::new(["childView.childProp"], |deps| deps[0].clone()),
    )
    .unwrap();

    assert_eq!(rt.get(parent, "parentProp"), Value::from("old-value"));

    let renders = counter();
    rt.observe(parent, "parentProp", bump(&renders)).unwrap();

    rt.set(child, "dependencyProp", "new-value").unwrap();
    assert_eq!(renders.get(), 1);
    assert_eq!(rt.get(child, "childProp"), Value::from("new-value"));
    assert_eq!(rt.get(parent, "parentProp"), Value::from("new-value"));
}

/// Test that a setter decides the cached value, not the assigned value.
#[test]
fn setter_result_wins_over_assigned_value() {
    let mut rt = Runtime::new();
    let view = rt.create_object_with([("dependencyProp", "old-value")]);
    rt.define_computed(
        view,
        "childProp",
        Computed::new(["dependencyProp"], |deps| deps[0].clone())
            .with_setter(|rt, object, _value| Ok(rt.get(object, "dependencyProp"))),
    )
    .unwrap();

    rt.set(view, "childProp", "parent-value").unwrap();
    assert_eq!(rt.get(view, "childProp"), Value::from("old-value"));

    // The setter registered edges, so the cache still tracks the dependency
    rt.set(view, "dependencyProp", "new-value").unwrap();
    assert_eq!(rt.get(view, "childProp"), Value::from("new-value"));
}

/// Test a two-way binding: the parent writes through to the child, and
/// child writes surface on the parent.
#[test]
fn two_way_binding_propagates_sets_both_ways() {
    let mut rt = Runtime::new();
    let child = rt.create_object_with([("childProp", "old-value")]);
    let parent = rt.create_object_with([("childView", child)]);
    rt.define_computed(parent, "parentProp", Computed::alias("childView.childProp"))
        .unwrap();

    assert_eq!(rt.get(parent, "parentProp"), Value::from("old-value"));

    rt.set(child, "childProp", "new-value").unwrap();
    assert_eq!(rt.get(parent, "parentProp"), Value::from("new-value"));

    rt.set(parent, "parentProp", "from-parent").unwrap();
    assert_eq!(rt.get(child, "childProp"), Value::from("from-parent"));
    assert_eq!(rt.get(parent, "parentProp"), Value::from("from-parent"));
}

/// Test that writing through a two-way binding notifies the bound property
/// and its dependents once, even though the write loops back through the
/// child.
#[test]
fn two_way_binding_write_notifies_once() {
    let mut rt = Runtime::new();
    let child = rt.create_object_with([("childProp", "old-value")]);
    let parent = rt.create_object_with([("childView", child)]);
    rt.define_computed(parent, "parentProp", Computed::alias("childView.childProp"))
        .unwrap();
    rt.define_computed(
        parent,
        "label",
        Computed::new(["parentProp"], |deps| Value::from(format!("<{}>", deps[0]))),
    )
    .unwrap();
    rt.get(parent, "label");

    let renders = counter();
    let labels = counter();
    rt.observe(parent, "parentProp", bump(&renders)).unwrap();
    rt.observe(parent, "label", bump(&labels)).unwrap();

    rt.set(parent, "parentProp", "x").unwrap();
    assert_eq!(renders.get(), 1);
    assert_eq!(labels.get(), 1);
    assert_eq!(rt.get(parent, "label"), Value::from("<x>"));
}

/// Test that a setter result which differs from the cache invalidates and
/// notifies the properties reading the written one.
#[test]
fn setter_write_invalidates_dependents() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("base", 1)]);
    rt.define_computed(
        obj,
        "doubled",
        Computed::new(["base"], |deps| {
            Value::from(deps[0].as_number().unwrap_or_default() * 2.0)
        })
        .with_setter(|_rt, _object, value| {
            Ok(Value::from(value.as_number().unwrap_or_default() * 2.0))
        }),
    )
    .unwrap();
    rt.define_computed(
        obj,
        "plus_one",
        Computed::new(["doubled"], |deps| {
            Value::from(deps[0].as_number().unwrap_or_default() + 1.0)
        }),
    )
    .unwrap();
    assert_eq!(rt.get(obj, "plus_one"), Value::from(3));

    let notified = counter();
    rt.observe(obj, "plus_one", bump(&notified)).unwrap();

    rt.set(obj, "doubled", 5).unwrap();
    assert!(rt.is_dirty(obj, "plus_one"));
    assert_eq!(notified.get(), 1);
    assert_eq!(rt.get(obj, "plus_one"), Value::from(11));

    // Same setter result again: nothing downstream changes
    rt.set(obj, "doubled", 5).unwrap();
    assert_eq!(notified.get(), 1);
    assert!(!rt.is_dirty(obj, "plus_one"));
}

/// Test that replacing an intermediate reference rebinds the key-path.
#[test]
fn reference_reassignment_rebinds_key_path() {
    let mut rt = Runtime::new();
    let old_child = rt.create_object_with([("prop", "old-child")]);
    let new_child = rt.create_object_with([("prop", "new-child")]);
    let parent = rt.create_object_with([("child", old_child)]);
    rt.define_computed(
        parent,
        "label",
        Computed::new(["child.prop"], |deps| deps[0].clone()),
    )
    .unwrap();

    assert_eq!(rt.get(parent, "label"), Value::from("old-child"));

    let notified = counter();
    rt.observe(parent, "label", bump(&notified)).unwrap();

    rt.set(parent, "child", new_child).unwrap();
    assert_eq!(notified.get(), 1);
    assert_eq!(rt.get(parent, "label"), Value::from("new-child"));

    // The old child is no longer on the chain
    rt.set(old_child, "prop", "stale").unwrap();
    assert_eq!(notified.get(), 1);
    assert!(!rt.is_dirty(parent, "label"));
    assert!(rt.dependents_of(old_child, "prop").is_empty());

    // The new child is
    rt.set(new_child, "prop", "fresh").unwrap();
    assert_eq!(notified.get(), 2);
    assert_eq!(rt.get(parent, "label"), Value::from("fresh"));
}

/// Test that a reassigned reference is picked up even without an
/// intermediate read.
#[test]
fn reference_reassignment_without_intermediate_read() {
    let mut rt = Runtime::new();
    let old_child = rt.create_object_with([("prop", 1)]);
    let new_child = rt.create_object_with([("prop", 2)]);
    let parent = rt.create_object_with([("child", old_child)]);
    rt.define_computed(parent, "label", Computed::new(["child.prop"], |deps| deps[0].clone()))
        .unwrap();
    rt.get(parent, "label");

    rt.set(parent, "child", new_child).unwrap();
    rt.set(old_child, "prop", 100).unwrap();
    rt.set(new_child, "prop", 3).unwrap();

    assert_eq!(rt.get(parent, "label"), Value::from(3));
}

/// Test that an incomplete chain reads as undefined and recovers once the
/// intermediate object exists.
#[test]
fn partially_constructed_graph_reads_undefined() {
    let mut rt = Runtime::new();
    let parent = rt.create_object();
    rt.define_computed(parent, "label", Computed::new(["child.prop"], |deps| deps[0].clone()))
        .unwrap();

    assert_eq!(rt.get(parent, "label"), Value::Undefined);

    let child = rt.create_object_with([("prop", "ready")]);
    rt.set(parent, "child", child).unwrap();
    assert_eq!(rt.get(parent, "label"), Value::from("ready"));
}

/// Test that setting an equal value fires nothing.
#[test]
fn equal_write_is_silent() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("a", "same")]);
    let notified = counter();
    rt.observe(obj, "a", bump(&notified)).unwrap();

    rt.set(obj, "a", "same").unwrap();
    assert_eq!(notified.get(), 0);
    assert_eq!(rt.get(obj, "a"), Value::from("same"));
}

/// Test that each invalidated property is notified once per write, even
/// when it is reachable along several paths.
#[test]
fn diamond_dependencies_notify_once() {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("a", 1)]);
    rt.define_computed(obj, "left", Computed::new(["a"], |deps| deps[0].clone()))
        .unwrap();
    rt.define_computed(obj, "right", Computed::new(["a"], |deps| deps[0].clone()))
        .unwrap();
    rt.define_computed(
        obj,
        "bottom",
        Computed::new(["left", "right"], |deps| Value::from(deps.to_vec())),
    )
    .unwrap();
    rt.get(obj, "bottom");

    let notified = counter();
    rt.observe(obj, "bottom", bump(&notified)).unwrap();

    rt.set(obj, "a", 2).unwrap();
    assert_eq!(notified.get(), 1);
    assert_eq!(
        rt.get(obj, "bottom"),
        Value::from(vec![Value::from(2), Value::from(2)])
    );
}

/// Test that destroying an object invalidates the properties reading
/// through it.
#[test]
fn destroy_invalidates_cross_object_dependents() {
    let mut rt = Runtime::new();
    let child = rt.create_object_with([("prop", "alive")]);
    let parent = rt.create_object_with([("child", child)]);
    rt.define_computed(parent, "label", Computed::new(["child.prop"], |deps| deps[0].clone()))
        .unwrap();
    assert_eq!(rt.get(parent, "label"), Value::from("alive"));

    let notified = counter();
    rt.observe(parent, "label", bump(&notified)).unwrap();
    rt.observe(child, "prop", bump(&notified)).unwrap();

    rt.destroy(child).unwrap();
    assert!(!rt.contains(child));
    assert_eq!(notified.get(), 1);
    assert_eq!(rt.get(parent, "label"), Value::Undefined);

    assert!(matches!(rt.destroy(child), Err(GraphError::UnknownObject(_))));
    assert!(matches!(
        rt.set(child, "prop", "x"),
        Err(GraphError::UnknownObject(_))
    ));
}

/// Test that destroying the dependent side leaves no edges behind.
#[test]
fn destroy_removes_outgoing_edges() {
    let mut rt = Runtime::new();
    let child = rt.create_object_with([("prop", 1)]);
    let parent = rt.create_object_with([("child", child)]);
    rt.define_computed(parent, "label", Computed::new(["child.prop"], |deps| deps[0].clone()))
        .unwrap();
    rt.get(parent, "label");
    assert_eq!(rt.dependents_of(child, "prop").len(), 1);

    rt.destroy(parent).unwrap();
    assert!(rt.dependents_of(child, "prop").is_empty());
    assert_eq!(rt.object_count(), 1);
}

/// Test that path reads and writes follow object references.
#[test]
fn path_access() {
    let mut rt = Runtime::new();
    let leaf = rt.create_object_with([("value", 1)]);
    let middle = rt.create_object_with([("leaf", leaf)]);
    let root = rt.create_object_with([("middle", middle)]);

    assert_eq!(rt.get_path(root, "middle.leaf.value"), Value::from(1));
    rt.set_path(root, "middle.leaf.value", 2).unwrap();
    assert_eq!(rt.get(leaf, "value"), Value::from(2));
    assert_eq!(rt.get_path(root, "middle.missing.value"), Value::Undefined);
}

/// Test that bulk reads and writes behave like the single-property calls.
#[test]
fn bulk_properties() {
    let mut rt = Runtime::new();
    let obj = rt.create_object();
    rt.set_properties(obj, [("a", 1), ("b", 2)]).unwrap();

    let values = rt.get_properties(obj, ["b", "a", "missing"]);
    assert_eq!(values["a"], Value::from(1));
    assert_eq!(values["b"], Value::from(2));
    assert_eq!(values["missing"], Value::Undefined);
}

/// Test that a stale handle reads as undefined instead of failing.
#[test]
fn unknown_object_reads_undefined() {
    let mut rt = Runtime::new();
    assert_eq!(rt.get(ObjectId::from(12345), "anything"), Value::Undefined);
    assert!(rt.observe(ObjectId::from(12345), "anything", |_| {}).is_err());
}

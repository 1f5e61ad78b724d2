//! Cell, reducer and derivation integration tests
//!
//! Exercises cells owned by mounted components through the `ripple` facade.

use std::cell::RefCell;
use std::rc::Rc;

use ripple::prelude::*;
use ripple_integration_tests::{Counter, CounterAction, Recorder, reduce_counter};
use rstest::{fixture, rstest};
use serde::{Deserialize, Serialize};

#[fixture]
fn mounted() -> (ComponentTree, Rc<Recorder>, ComponentId) {
	let tree = ComponentTree::new();
	let recorder = Rc::new(Recorder::default());
	let id = tree.mount_root(recorder.clone()).unwrap();
	(tree, recorder, id)
}

#[rstest]
fn test_cell_set_and_update_scenario(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, recorder, id) = mounted;
	let count = use_state(&tree, id, 0, Some("count")).unwrap();
	let seen = Rc::new(RefCell::new(Vec::new()));
	let sink = seen.clone();
	count.watch(move |old: &i32, new: &i32| sink.borrow_mut().push((*old, *new)));

	// Act
	let first = count.set(5);
	let repeated = count.set(5);
	let bumped = count.set_with(|n| n + 1);

	// Assert
	assert!(first);
	assert!(!repeated);
	assert!(bumped);
	assert_eq!(count.get(), 6);
	assert_eq!(*seen.borrow(), vec![(0, 5), (5, 6)]);
	assert_eq!(*recorder.count_effects.borrow(), vec![(0, 5), (5, 6)]);

	// Subscriber messages wait for delivery
	assert!(recorder.messages.borrow().is_empty());
	assert_eq!(tree.deliver_pending(), 2);
	assert_eq!(recorder.messages.borrow().len(), 2);
}

#[rstest]
fn test_watchers_run_before_delivery(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, recorder, id) = mounted;
	let count = use_state(&tree, id, 0, Some("count")).unwrap();
	let observed = Rc::new(RefCell::new(Vec::new()));
	let sink = observed.clone();
	let observer = recorder.clone();
	count.watch(move |_: &i32, _: &i32| sink.borrow_mut().push(observer.messages.borrow().len()));

	// Act
	count.set(1);
	count.set(2);
	tree.deliver_pending();

	// Assert
	assert_eq!(*observed.borrow(), vec![0, 0]);
	assert_eq!(recorder.messages.borrow().len(), 2);
}

#[rstest]
fn test_reducer_scenario_notifies_four_times(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, recorder, id) = mounted;
	let counter = use_model_reducer(
		&tree,
		id,
		reduce_counter,
		Counter { count: 0 },
		Some("counter"),
	)
	.unwrap();

	// Act
	for _ in 0..3 {
		counter.dispatch(CounterAction::Increment);
	}
	counter.dispatch(CounterAction::Reset);
	counter.dispatch(CounterAction::Reset);
	let delivered = tree.deliver_pending();

	// Assert
	assert_eq!(counter.get(), Counter { count: 0 });
	assert_eq!(delivered, 4);
	assert_eq!(recorder.messages.borrow().len(), 4);
}

#[rstest]
fn test_derivation_scenario(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, _recorder, id) = mounted;
	let a = use_state(&tree, id, 3, Some("a")).unwrap();
	let b = use_state(&tree, id, 4, Some("b")).unwrap();
	let sum = use_derived(&tree, id, (a.clone(), b.clone()), |(x, y): (i32, i32)| x + y, Some("sum"))
		.unwrap();
	assert_eq!(sum.get(), 7);

	// Act
	a.set(10);
	let after_a = sum.get();
	b.set(20);
	let after_b = sum.get();

	// Assert
	assert_eq!(after_a, 14);
	assert_eq!(after_b, 30);
}

#[rstest]
fn test_derivation_skips_unchanged_results(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, recorder, id) = mounted;
	let text = use_state(&tree, id, "abc".to_string(), None).unwrap();
	let count = use_derived(&tree, id, (text.clone(),), |(s,): (String,)| s.len() as i32, Some("count"))
		.unwrap();

	// Act
	text.set("xyz".to_string());
	text.set("wxyz".to_string());

	// Assert
	assert_eq!(count.get(), 4);
	assert_eq!(*recorder.count_effects.borrow(), vec![(3, 4)]);
}

#[rstest]
fn test_derivation_over_derivation(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	let (tree, _recorder, id) = mounted;
	let base = use_state(&tree, id, 2, None).unwrap();
	let doubled = use_derived(&tree, id, (base.clone(),), |(n,): (i32,)| n * 2, None).unwrap();
	let quadrupled = use_derived(&tree, id, (doubled.clone(),), |(n,): (i32,)| n * 2, None).unwrap();

	base.set(5);

	assert_eq!(doubled.get(), 10);
	assert_eq!(quadrupled.get(), 20);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
	label: String,
	value: f64,
}

#[rstest]
fn test_model_cells_compare_by_fields(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	// Arrange
	let (tree, _recorder, id) = mounted;
	let reading = use_model_state(
		&tree,
		id,
		Reading {
			label: "temp".into(),
			value: 20.0,
		},
		Some("reading"),
	)
	.unwrap();

	// Act
	let same_label = reading
		.update(FieldPatch::new().field("label", "temp"))
		.unwrap();
	let new_value = reading
		.update(FieldPatch::new().field("value", 21.5))
		.unwrap();
	let to_nan = reading.replace(Reading {
		label: "temp".into(),
		value: f64::NAN,
	});
	let nan_again = reading.replace(Reading {
		label: "temp".into(),
		value: f64::NAN,
	});

	// Assert
	assert!(!same_label);
	assert!(new_value);
	assert!(to_nan);
	assert!(!nan_again);
	assert!(reading.get().value.is_nan());
	assert_eq!(tree.deliver_pending(), 2);
}

#[rstest]
fn test_unknown_field_patch_is_rejected(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	let (tree, _recorder, id) = mounted;
	let reading = use_model_state(
		&tree,
		id,
		Reading {
			label: "temp".into(),
			value: 0.0,
		},
		None,
	)
	.unwrap();

	let result = reading.update(FieldPatch::new().field("unit", "C"));

	assert!(result.is_err());
	assert_eq!(reading.get().value, 0.0);
	assert!(tree.mailbox().is_empty());
}

#[rstest]
fn test_unwatch_is_idempotent(mounted: (ComponentTree, Rc<Recorder>, ComponentId)) {
	let (tree, _recorder, id) = mounted;
	let count = use_state(&tree, id, 0, None).unwrap();
	let calls = Rc::new(RefCell::new(0));
	let sink = calls.clone();
	let handle = count.watch(move |_: &i32, _: &i32| *sink.borrow_mut() += 1);
	let later_calls = Rc::new(RefCell::new(0));
	let later_sink = later_calls.clone();
	count.watch(move |_: &i32, _: &i32| *later_sink.borrow_mut() += 1);

	assert!(handle.unwatch());
	assert!(!handle.unwatch());
	count.set(1);

	assert_eq!(*calls.borrow(), 0);
	assert_eq!(*later_calls.borrow(), 1);
}

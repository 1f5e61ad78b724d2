//! Store integration tests
//!
//! Independent provider instances, store-targeted effects and message
//! delivery across rounds.

use std::cell::RefCell;
use std::rc::Rc;

use ripple::prelude::*;
use ripple::Settings;
use ripple_integration_tests::{Container, Counter, CounterAction, reduce_counter};
use rstest::{fixture, rstest};

thread_local! {
	static COUNTER: Store<Counter, CounterAction> =
		Store::model(Counter { count: 0 }, Some("counter"), reduce_counter);
}

fn counter_store() -> Store<Counter, CounterAction> {
	COUNTER.with(Clone::clone)
}

/// Records store effects and echoes every change as a message count.
#[derive(Default)]
struct CounterBadge {
	effects: RefCell<Vec<(i32, i32)>>,
	messages: RefCell<usize>,
	echo: RefCell<Option<StoreHandle<Counter, CounterAction>>>,
}

impl Component for CounterBadge {
	fn effects() -> Result<EffectTable<Self>, ContextError> {
		EffectTable::new().register(
			[&counter_store()],
			|this: &Self, old: &Counter, new: &Counter| {
				this.effects.borrow_mut().push((old.count, new.count));
			},
		)
	}

	fn on_state_changed(&self, event: &StateChanged) {
		*self.messages.borrow_mut() += 1;
		let Some(counter) = event.new_value::<Counter>() else {
			return;
		};
		if counter.count < 3
			&& let Some(handle) = self.echo.borrow().as_ref()
		{
			handle.dispatch(CounterAction::Increment);
		}
	}
}

#[fixture]
fn store() -> Store<Counter, CounterAction> {
	counter_store()
}

#[rstest]
fn test_sibling_providers_hold_independent_state(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::new();
	let app = tree.mount_root(Rc::new(Container)).unwrap();
	let left = store.provider(&tree, Some(app)).unwrap();
	let right = store.provider(&tree, Some(app)).unwrap();
	let left_badge = Rc::new(CounterBadge::default());
	let right_badge = Rc::new(CounterBadge::default());
	let left_id = tree.mount(left, left_badge.clone()).unwrap();
	let right_id = tree.mount(right, right_badge.clone()).unwrap();
	let left_handle = store.use_store(&tree, left_id, true).unwrap();
	let right_handle = store.use_store(&tree, right_id, true).unwrap();

	// Act
	left_handle.dispatch(CounterAction::Increment);
	left_handle.dispatch(CounterAction::Increment);
	tree.deliver_pending();

	// Assert
	assert_eq!(left_handle.get(), Counter { count: 2 });
	assert_eq!(right_handle.get(), Counter { count: 0 });
	assert_eq!(*left_badge.effects.borrow(), vec![(0, 1), (1, 2)]);
	assert!(right_badge.effects.borrow().is_empty());
	assert_eq!(*left_badge.messages.borrow(), 2);
	assert_eq!(*right_badge.messages.borrow(), 0);
}

#[rstest]
fn test_store_effect_runs_once_per_change(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::new();
	let provider = store.provider(&tree, None).unwrap();
	let badge = Rc::new(CounterBadge::default());
	let id = tree.mount(provider, badge.clone()).unwrap();
	let handle = store.use_store(&tree, id, false).unwrap();
	let again = store.use_store(&tree, id, false).unwrap();

	// Act
	handle.dispatch(CounterAction::Increment);
	again.dispatch(CounterAction::Reset);
	again.dispatch(CounterAction::Reset);

	// Assert
	assert_eq!(*badge.effects.borrow(), vec![(0, 1), (1, 0)]);
	assert!(tree.mailbox().is_empty());
}

#[rstest]
fn test_nearest_store_provider_wins(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::new();
	let outer = store.provider(&tree, None).unwrap();
	let inner = store.provider(&tree, Some(outer)).unwrap();
	let deep = tree.mount(inner, Rc::new(Container)).unwrap();

	// Act
	let handle = store.use_store(&tree, deep, false).unwrap();
	handle.dispatch(CounterAction::Increment);

	// Assert
	assert_eq!(store.provided(&tree, inner).unwrap().get().count, 1);
	assert_eq!(store.provided(&tree, outer).unwrap().get().count, 0);
}

#[rstest]
fn test_store_without_provider_fails(store: Store<Counter, CounterAction>) {
	let tree = ComponentTree::new();
	let badge = tree.mount_root(Rc::new(CounterBadge::default())).unwrap();

	let result = store.use_store(&tree, badge, true).map(|handle| handle.get());

	assert_eq!(
		result,
		Err(ContextError::StoreNotFound {
			store: "counter".into(),
			consumer: "CounterBadge"
		})
	);
}

#[rstest]
fn test_handlers_may_dispatch_during_delivery(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::new();
	let provider = store.provider(&tree, None).unwrap();
	let badge = Rc::new(CounterBadge::default());
	let id = tree.mount(provider, badge.clone()).unwrap();
	let handle = store.use_store(&tree, id, true).unwrap();
	*badge.echo.borrow_mut() = Some(handle.clone());

	// Act
	handle.dispatch(CounterAction::Increment);
	let delivered = tree.deliver_pending();

	// Assert
	assert_eq!(handle.get(), Counter { count: 3 });
	assert_eq!(delivered, 3);
	assert_eq!(*badge.effects.borrow(), vec![(0, 1), (1, 2), (2, 3)]);

	*badge.echo.borrow_mut() = None;
}

#[rstest]
fn test_round_limit_leaves_cascade_queued(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::with_settings(Settings::default().with_max_delivery_rounds(1));
	let provider = store.provider(&tree, None).unwrap();
	let badge = Rc::new(CounterBadge::default());
	let id = tree.mount(provider, badge.clone()).unwrap();
	let handle = store.use_store(&tree, id, true).unwrap();
	*badge.echo.borrow_mut() = Some(handle.clone());

	// Act
	handle.dispatch(CounterAction::Increment);
	let first = tree.deliver_pending();
	let second = tree.deliver_pending();

	// Assert
	assert_eq!(first, 1);
	assert_eq!(second, 1);
	assert_eq!(handle.get(), Counter { count: 3 });
	assert_eq!(tree.mailbox().len(), 1);

	*badge.echo.borrow_mut() = None;
}

#[rstest]
fn test_unmounted_consumer_gets_nothing(store: Store<Counter, CounterAction>) {
	// Arrange
	let tree = ComponentTree::new();
	let provider = store.provider(&tree, None).unwrap();
	let badge = Rc::new(CounterBadge::default());
	let id = tree.mount(provider, badge.clone()).unwrap();
	let handle = store.use_store(&tree, id, true).unwrap();
	handle.dispatch(CounterAction::Increment);

	// Act
	tree.unmount(id);
	handle.dispatch(CounterAction::Increment);
	let delivered = tree.deliver_pending();

	// Assert
	assert_eq!(delivered, 0);
	assert_eq!(*badge.effects.borrow(), vec![(0, 1)]);
	assert_eq!(*badge.messages.borrow(), 0);
	assert_eq!(handle.state().subscriber_count(), 0);
}

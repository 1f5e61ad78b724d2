//! Context and reducer-context integration tests
//!
//! Provider resolution, default fallback and the warning it logs, and
//! contexts feeding derivations.

use std::cell::RefCell;
use std::rc::Rc;

use ripple::prelude::*;
use ripple::{Settings, StateChanged};
use ripple_integration_tests::{Container, Counter, CounterAction, capture_logs, reduce_counter};
use rstest::{fixture, rstest};

#[derive(Default)]
struct ThemedLabel {
	theme_effects: RefCell<Vec<(String, String)>>,
	rendered: RefCell<Vec<String>>,
}

impl Component for ThemedLabel {
	fn effects() -> Result<EffectTable<Self>, ContextError> {
		EffectTable::new().register(["theme"], |this: &Self, old: &String, new: &String| {
			this.theme_effects
				.borrow_mut()
				.push((old.clone(), new.clone()));
		})
	}

	fn on_state_changed(&self, event: &StateChanged) {
		if let Some(theme) = event.new_value::<String>() {
			self.rendered.borrow_mut().push(theme.clone());
		}
	}
}

#[fixture]
fn theme() -> Context<String> {
	create_context("light".to_string(), Some("theme"))
}

#[rstest]
fn test_nested_providers_resolve_innermost(theme: Context<String>) {
	// Arrange
	let tree = ComponentTree::new();
	let app = tree.mount_root(Rc::new(Container)).unwrap();
	let outer = tree.provide(Some(app), &theme, "dark".to_string()).unwrap();
	let panel = tree.mount(outer, Rc::new(Container)).unwrap();
	let inner = tree
		.provide(Some(panel), &theme, "high-contrast".to_string())
		.unwrap();
	let label = Rc::new(ThemedLabel::default());
	let label_id = tree.mount(inner, label.clone()).unwrap();
	let sidebar = Rc::new(ThemedLabel::default());
	let sidebar_id = tree.mount(panel, sidebar.clone()).unwrap();

	// Act
	let label_theme = use_context(&tree, label_id, &theme, ContextOptions::default()).unwrap();
	let sidebar_theme = use_context(&tree, sidebar_id, &theme, ContextOptions::default()).unwrap();
	sidebar_theme.set("sepia".to_string());
	tree.deliver_pending();

	// Assert
	assert_eq!(label_theme.get(), "high-contrast");
	assert_eq!(sidebar_theme.get(), "sepia");
	assert!(label.theme_effects.borrow().is_empty());
	assert_eq!(
		*sidebar.theme_effects.borrow(),
		vec![("dark".to_string(), "sepia".to_string())]
	);
	assert_eq!(*sidebar.rendered.borrow(), vec!["sepia".to_string()]);
	assert_eq!(
		tree.provided_state(outer, &theme).map(|state| state.get()),
		Some("sepia".to_string())
	);
}

#[rstest]
fn test_missing_provider_falls_back_to_default_and_warns(theme: Context<String>) {
	// Arrange
	let tree = ComponentTree::new();
	let label = tree.mount_root(Rc::new(ThemedLabel::default())).unwrap();
	let mut handle = None;

	// Act
	let logs = capture_logs(|| {
		handle = Some(use_context(&tree, label, &theme, ContextOptions::default()).unwrap());
		use_context(&tree, label, &theme, ContextOptions::default()).unwrap();
	});

	// Assert
	let handle = handle.unwrap();
	assert!(handle.is_default());
	assert_eq!(handle.get(), "light");
	let warnings: Vec<_> = logs.iter().filter(|line| line.starts_with("[WARN]")).collect();
	assert_eq!(warnings.len(), 1);
	assert!(warnings[0].contains("no provider found"));
}

#[rstest]
fn test_default_warning_can_be_disabled(theme: Context<String>) {
	// Arrange
	let settings = Settings::from_lookup(|key| {
		(key == "RIPPLE_WARN_DEFAULT_CONTEXT").then(|| "off".to_string())
	})
	.unwrap();
	let tree = ComponentTree::with_settings(settings);
	let label = tree.mount_root(Rc::new(ThemedLabel::default())).unwrap();

	// Act
	let logs = capture_logs(|| {
		let handle = use_context(&tree, label, &theme, ContextOptions::default()).unwrap();
		assert!(handle.is_default());
	});

	// Assert
	assert!(!logs.iter().any(|line| line.starts_with("[WARN]")));
}

#[rstest]
fn test_required_context_without_provider_fails(theme: Context<String>) {
	let tree = ComponentTree::new();
	let label = tree.mount_root(Rc::new(ThemedLabel::default())).unwrap();

	let result = use_context(
		&tree,
		label,
		&theme,
		ContextOptions::default().with_required(true),
	)
	.map(|handle| handle.get());

	assert_eq!(
		result,
		Err(ContextError::ContextNotFound {
			context: "theme".into(),
			consumer: "ThemedLabel"
		})
	);
}

#[rstest]
fn test_unmounting_provider_unprovides_subtree(theme: Context<String>) {
	// Arrange
	let tree = ComponentTree::new();
	let provider = tree.provide(None, &theme, "dark".to_string()).unwrap();
	let label = tree.mount(provider, Rc::new(ThemedLabel::default())).unwrap();
	let handle = use_context(&tree, label, &theme, ContextOptions::default()).unwrap();
	let provided = handle.state().downgrade();
	drop(handle);

	// Act
	let removed = tree.unmount(provider);
	let remounted = tree.mount_root(Rc::new(ThemedLabel::default())).unwrap();
	let fallback = use_context(&tree, remounted, &theme, ContextOptions::default()).unwrap();

	// Assert
	assert_eq!(removed, 2);
	assert!(provided.upgrade().is_none());
	assert!(!tree.contains(label));
	assert!(fallback.is_default());
}

#[rstest]
fn test_context_feeds_derivation(theme: Context<String>) {
	// Arrange
	let tree = ComponentTree::new();
	let provider = tree.provide(None, &theme, "dark".to_string()).unwrap();
	let label = tree.mount(provider, Rc::new(Container)).unwrap();
	let handle = use_context(
		&tree,
		label,
		&theme,
		ContextOptions::default().with_subscribe(false),
	)
	.unwrap();
	let is_dark = use_derived(
		&tree,
		label,
		(handle.clone(),),
		|(theme,): (String,)| theme == "dark",
		None,
	)
	.unwrap();

	// Act
	handle.set("light".to_string());

	// Assert
	assert!(!is_dark.get());
	assert_eq!(tree.deliver_pending(), 1);
}

#[rstest]
fn test_model_context_partial_update() {
	// Arrange
	let tree = ComponentTree::new();
	let session = create_model_context(Counter { count: 0 }, Some("session"));
	let provider = tree.provide(None, &session, Counter { count: 1 }).unwrap();
	let reader = tree.mount(provider, Rc::new(Container)).unwrap();
	let handle = use_context(&tree, reader, &session, ContextOptions::default()).unwrap();

	// Act
	let unchanged = handle.update(FieldPatch::new().field("count", 1)).unwrap();
	let changed = handle.update(FieldPatch::new().field("count", 2)).unwrap();

	// Assert
	assert!(!unchanged);
	assert!(changed);
	assert_eq!(handle.get(), Counter { count: 2 });
	assert_eq!(tree.deliver_pending(), 1);
}

#[rstest]
fn test_reducer_context_shared_by_subtree() {
	// Arrange
	let tree = ComponentTree::new();
	let counter_context = create_reducer_context::<Counter, CounterAction>(Some("counter"));
	let binding = ReducerBinding::model(Counter { count: 0 }, Some("counter"), reduce_counter);
	let provider = tree
		.provide_reducer(None, &counter_context, binding.clone())
		.unwrap();
	let toolbar = tree.mount(provider, Rc::new(Container)).unwrap();
	let status = tree.mount(provider, Rc::new(Container)).unwrap();
	let outside = tree.mount_root(Rc::new(Container)).unwrap();

	// Act
	let from_toolbar = use_reducer_context(&tree, toolbar, &counter_context, false).unwrap();
	let from_status = use_reducer_context(&tree, status, &counter_context, true).unwrap();
	from_toolbar.dispatch(CounterAction::Increment);
	from_toolbar.dispatch(CounterAction::Increment);
	let missing = use_reducer_context(&tree, outside, &counter_context, true);

	// Assert
	assert_eq!(from_status.get(), Counter { count: 2 });
	assert!(from_status.ptr_eq(&binding));
	assert_eq!(tree.deliver_pending(), 2);
	assert!(matches!(
		missing,
		Err(ContextError::ReducerContextNotFound { .. })
	));
}

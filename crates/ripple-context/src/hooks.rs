//! Component-bound cell constructors.
//!
//! Each hook creates a cell owned by a mounted component:
//!
//! - the component is subscribed to the cell's change messages
//! - the cell lives until the component unmounts
//! - if the cell is named, the component's effect handlers for that name are
//!   bound to it
//!
//! # Example
//!
//! ```
//! use ripple_context::{Component, ComponentTree, EffectTable, ContextError, use_state};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Counter {
//! 	last: Cell<i32>,
//! }
//!
//! impl Component for Counter {
//! 	fn effects() -> Result<EffectTable<Self>, ContextError> {
//! 		EffectTable::new().register(["count"], |this: &Self, _: &i32, new: &i32| this.last.set(*new))
//! 	}
//! }
//!
//! let tree = ComponentTree::new();
//! let counter = Rc::new(Counter::default());
//! let id = tree.mount_root(counter.clone()).unwrap();
//!
//! let count = use_state(&tree, id, 0, Some("count")).unwrap();
//! count.set(3);
//! assert_eq!(counter.last.get(), 3);
//! ```

use std::rc::Rc;

use ripple_reactive::{
	ComponentId, Derived, Model, ModelState, ReducerBinding, Source, Sources, State, debug_log,
};

use crate::error::Result;
use crate::tree::ComponentTree;

fn adopt<S: Source>(tree: &ComponentTree, component: ComponentId, source: &S) -> Result<()> {
	tree.subscribe(component, source)?;
	tree.keep_alive(component, Rc::new(source.clone()))?;
	if let Some(name) = source.source_state().name() {
		tree.connect_effects(component, name.into(), source)?;
		debug_log!("cell `{}` adopted by {}", name, component);
	}
	Ok(())
}

/// Create a value cell owned by `component`
pub fn use_state<T: PartialEq + 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	initial: T,
	name: Option<&str>,
) -> Result<State<T>> {
	let state = State::with_name(initial, name);
	adopt(tree, component, &state)?;
	Ok(state)
}

/// Create a model cell owned by `component`
pub fn use_model_state<S: Model>(
	tree: &ComponentTree,
	component: ComponentId,
	initial: S,
	name: Option<&str>,
) -> Result<ModelState<S>> {
	let state = ModelState::with_name(initial, name);
	adopt(tree, component, &state)?;
	Ok(state)
}

/// Create a reducer binding owned by `component`
pub fn use_reducer<T: PartialEq + 'static, A: 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	transition: impl Fn(&T, &A) -> T + 'static,
	initial: T,
	name: Option<&str>,
) -> Result<ReducerBinding<T, A>> {
	let binding = ReducerBinding::with_name(initial, name, transition);
	adopt(tree, component, &binding)?;
	Ok(binding)
}

/// Create a reducer binding over a model, owned by `component`
pub fn use_model_reducer<T: Model, A: 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	transition: impl Fn(&T, &A) -> T + 'static,
	initial: T,
	name: Option<&str>,
) -> Result<ReducerBinding<T, A>> {
	let binding = ReducerBinding::model(initial, name, transition);
	adopt(tree, component, &binding)?;
	Ok(binding)
}

/// Create a derivation owned by `component`.
///
/// The derivation stays attached to its sources until `component`
/// unmounts (or every other handle to it is dropped, whichever is later).
pub fn use_derived<S: Sources, T: PartialEq + 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	sources: S,
	selector: impl Fn(S::Values) -> T + 'static,
	name: Option<&str>,
) -> Result<Derived<T>> {
	let derived = Derived::with_name(sources, name, selector);
	adopt(tree, component, &derived)?;
	Ok(derived)
}

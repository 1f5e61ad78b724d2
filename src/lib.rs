//! # Ripple
//!
//! Reactive state for component trees.
//!
//! Ripple gives components observable state without a global store:
//!
//! - **Cells** ([`State`], [`ModelState`]) hold a value, skip updates that
//!   compare equal, run watchers synchronously and post one
//!   [`StateChanged`] message per subscriber for every accepted change
//! - **Derivations** ([`Derived`]) recompute from one or more sources and
//!   notify only when the computed result changes
//! - **Reducers** ([`ReducerBinding`]) drive a cell through a pure
//!   transition function
//! - **Contexts and stores** ([`Context`], [`ReducerContext`], [`Store`])
//!   share state with a subtree; consumers resolve the nearest enclosing
//!   provider
//! - **Effects** ([`EffectTable`]) bind per-type handlers to cells by name
//!   or by store identity
//!
//! ## Crates
//!
//! - `ripple-reactive`: cells, models, reducers, derivations and delivery
//! - `ripple-context`: the component tree, effects, contexts, stores and hooks
//!
//! Both are re-exported here; most applications only need [`prelude`].
//!
//! ## Quick Example
//!
//! ```
//! use ripple::prelude::*;
//! use std::rc::Rc;
//!
//! #[derive(Debug, Clone, Copy)]
//! enum Action {
//! 	Increment,
//! 	Reset,
//! }
//!
//! struct CounterView;
//! impl Component for CounterView {}
//!
//! let counter = create_store(
//! 	|count: &i32, action: &Action| match action {
//! 		Action::Increment => count + 1,
//! 		Action::Reset => 0,
//! 	},
//! 	0,
//! 	Some("counter"),
//! );
//!
//! let tree = ComponentTree::new();
//! let provider = counter.provider(&tree, None).unwrap();
//! let view = tree.mount(provider, Rc::new(CounterView)).unwrap();
//!
//! let handle = counter.use_store(&tree, view, true).unwrap();
//! handle.dispatch(Action::Increment);
//! handle.dispatch(Action::Increment);
//!
//! assert_eq!(handle.get(), 2);
//! assert_eq!(tree.deliver_pending(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `debug-hooks` - cell lifecycle logging through `tracing` in debug builds

pub use ripple_context;
pub use ripple_reactive;

// Re-export cell types
pub use ripple_reactive::{
	CellId, Comparator, ComponentId, ComponentRef, DeliveryChannel, Derived, Envelope, FieldMap,
	FieldPatch, Mailbox, Model, ModelState, ReactiveError, ReducerBinding, Settings,
	SettingsError, Source, Sources, State, StateChanged, WatchHandle, WatcherId, WeakState,
	apply_patch, model_eq,
};

// Re-export component types
pub use ripple_context::{
	Component, ComponentTree, Context, ContextError, ContextHandle, ContextOptions, EffectTable,
	EffectTarget, ReducerContext, Store, StoreHandle, StoreId, create_context,
	create_model_context, create_reducer_context, create_store, use_context, use_derived,
	use_model_reducer, use_model_state, use_reducer, use_reducer_context, use_state,
};

/// Convenience re-exports for building components
pub mod prelude {
	pub use crate::{
		Component, ComponentId, ComponentTree, Context, ContextError, ContextHandle,
		ContextOptions, Derived, EffectTable, EffectTarget, FieldPatch, Model, ModelState,
		ReducerBinding, ReducerContext, State, StateChanged, Store, StoreHandle, create_context,
		create_model_context, create_reducer_context, create_store, use_context, use_derived,
		use_model_reducer, use_model_state, use_reducer, use_reducer_context, use_state,
	};
}

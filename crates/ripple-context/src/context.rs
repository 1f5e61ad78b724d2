//! Context system
//!
//! A [`Context`] lets a component share a cell with its whole subtree
//! without threading it through every level.
//!
//! - [`ComponentTree::provide`] mounts a provider node that owns a fresh cell
//!   seeded with the given value.
//! - [`use_context`] resolves the nearest provider *for that exact context*
//!   above the consumer. Contexts are compared by identity; two contexts with
//!   the same name never match each other.
//! - Without a provider the consumer gets a private cell seeded with the
//!   context default and a handle flagged [`is_default`](ContextHandle::is_default),
//!   or [`ContextError::ContextNotFound`] when the lookup is required.
//!
//! ## Example
//!
//! ```
//! use ripple_context::{Component, ComponentTree, ContextOptions, create_context, use_context};
//! use std::rc::Rc;
//!
//! struct Panel;
//! impl Component for Panel {}
//!
//! let theme = create_context("light".to_string(), Some("theme"));
//! let tree = ComponentTree::new();
//!
//! let provider = tree.provide(None, &theme, "dark".to_string()).unwrap();
//! let panel = tree.mount(provider, Rc::new(Panel)).unwrap();
//!
//! let handle = use_context(&tree, panel, &theme, ContextOptions::default()).unwrap();
//! assert_eq!(handle.get(), "dark");
//! assert!(!handle.is_default());
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use std::rc::Rc;

use ripple_reactive::{
	ComponentId, FieldPatch, Model, ModelState, State, Source, WatchHandle, apply_patch,
};

use crate::error::{ContextError, Result, display_name};
use crate::tree::{ComponentTree, ProviderKey};

pub(crate) fn next_context_id() -> u64 {
	static COUNTER: AtomicU64 = AtomicU64::new(0);
	COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Builds the cell a provider or default-sourced consumer owns
pub(crate) type CellFactory<T> = fn(T, Option<&str>) -> State<T>;

pub(crate) fn model_cell<T: Model>(value: T, name: Option<&str>) -> State<T> {
	ModelState::with_name(value, name).into_state()
}

struct ContextInner<T: 'static> {
	id: u64,
	default: T,
	name: Option<String>,
	make_cell: CellFactory<T>,
}

/// A context declaration: a default value and an identity.
///
/// Clones share the identity.
pub struct Context<T: 'static> {
	inner: Rc<ContextInner<T>>,
}

impl<T: 'static> Clone for Context<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Clone + PartialEq + 'static> Context<T> {
	/// Declare a context over plain values
	pub fn new(default: T, name: Option<&str>) -> Self {
		Self::with_factory(default, name, State::with_name)
	}
}

impl<T: Model> Context<T> {
	/// Declare a context whose cells compare models by field map.
	///
	/// Handles resolved from it accept [`ContextHandle::update`].
	pub fn model(default: T, name: Option<&str>) -> Self {
		Self::with_factory(default, name, model_cell::<T>)
	}
}

impl<T: 'static> Context<T> {
	fn with_factory(default: T, name: Option<&str>, make_cell: CellFactory<T>) -> Self {
		Self {
			inner: Rc::new(ContextInner {
				id: next_context_id(),
				default,
				name: name.map(str::to_string),
				make_cell,
			}),
		}
	}

	/// Name of this context
	pub fn name(&self) -> Option<&str> {
		self.inner.name.as_deref()
	}

	/// Value used when no provider is found
	pub fn default_value(&self) -> &T {
		&self.inner.default
	}

	/// Returns true if both handles are the same context
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	pub(crate) fn key(&self) -> ProviderKey {
		ProviderKey::Context(self.inner.id)
	}

	fn make_cell(&self, value: T) -> State<T> {
		(self.inner.make_cell)(value, self.name())
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Context<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Context")
			.field("name", &self.inner.name)
			.field("default", &self.inner.default)
			.finish()
	}
}

/// Declare a context over plain values
pub fn create_context<T: Clone + PartialEq + 'static>(default: T, name: Option<&str>) -> Context<T> {
	Context::new(default, name)
}

/// Declare a context over models
pub fn create_model_context<T: Model>(default: T, name: Option<&str>) -> Context<T> {
	Context::model(default, name)
}

impl ComponentTree {
	/// Mount a provider for `context` holding `value`.
	///
	/// The provider owns a fresh cell; mount consumers below the returned id.
	/// Unmounting the provider releases the cell and returns its subtree to
	/// the unprovided state.
	pub fn provide<T: 'static>(
		&self,
		parent: Option<ComponentId>,
		context: &Context<T>,
		value: T,
	) -> Result<ComponentId> {
		let state = context.make_cell(value);
		self.mount_provider(parent, "ContextProvider", context.key(), Rc::new(state))
	}

	/// The cell held by provider `provider`, if it provides `context`.
	pub fn provided_state<T: 'static>(
		&self,
		provider: ComponentId,
		context: &Context<T>,
	) -> Option<State<T>> {
		self.provider_payload(provider, context.key())?
			.downcast_ref::<State<T>>()
			.cloned()
	}
}

/// How [`use_context`] resolves and observes a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
	/// Subscribe the consumer to change messages
	pub subscribe: bool,
	/// Fail instead of falling back to the default
	pub required: bool,
}

impl Default for ContextOptions {
	fn default() -> Self {
		Self {
			subscribe: true,
			required: false,
		}
	}
}

impl ContextOptions {
	/// Set whether the consumer subscribes
	pub fn with_subscribe(mut self, subscribe: bool) -> Self {
		self.subscribe = subscribe;
		self
	}

	/// Set whether a missing provider is an error
	pub fn with_required(mut self, required: bool) -> Self {
		self.required = required;
		self
	}
}

/// Consumer-side view of a context's cell.
///
/// Writes go to the provider's cell and reach every consumer of that
/// provider.
pub struct ContextHandle<T: 'static> {
	state: State<T>,
	is_default: bool,
}

impl<T: 'static> Clone for ContextHandle<T> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			is_default: self.is_default,
		}
	}
}

impl<T: 'static> ContextHandle<T> {
	/// Clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.state.get()
	}

	/// Current value without cloning
	pub fn get_rc(&self) -> Rc<T> {
		self.state.get_rc()
	}

	/// Replace the value, see [`State::set`]
	pub fn set(&self, value: T) -> bool {
		self.state.set(value)
	}

	/// Replace the value with `f(current)`, see [`State::set_with`]
	pub fn set_with(&self, f: impl FnOnce(&T) -> T) -> bool {
		self.state.set_with(f)
	}

	/// Register a synchronous callback
	pub fn watch(&self, callback: impl Fn(&T, &T) + 'static) -> WatchHandle {
		self.state.watch(callback)
	}

	/// True when no provider was found and the handle holds a private
	/// default-seeded cell
	pub fn is_default(&self) -> bool {
		self.is_default
	}

	/// Name of the context
	pub fn name(&self) -> Option<&str> {
		self.state.name()
	}

	/// The resolved cell
	pub fn state(&self) -> &State<T> {
		&self.state
	}
}

impl<T: Model> ContextHandle<T> {
	/// Override some fields of the provided model
	pub fn update(&self, patch: FieldPatch) -> Result<bool> {
		Ok(apply_patch(&self.state, patch)?)
	}
}

impl<T: 'static> Source for ContextHandle<T> {
	type Value = T;

	fn source_state(&self) -> &State<T> {
		&self.state
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for ContextHandle<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContextHandle")
			.field("value", &*self.state.get_rc())
			.field("is_default", &self.is_default)
			.finish()
	}
}

/// Resolve `context` for `component`.
///
/// Walks from `component` towards the root and returns the first provider
/// for `context`. Without one, returns a handle to a private cell seeded
/// with the context default, or fails if `options.required` is set. The
/// private cell is created once per component and context and lives until
/// `component` unmounts; repeat calls share it.
///
/// When the context is named, `component`'s effect handlers for that name
/// are bound to the resolved cell.
///
/// # Errors
///
/// - [`ContextError::ContextNotFound`] for a required context without a
///   provider
/// - [`ContextError::UnknownComponent`] if `component` is not mounted
pub fn use_context<T: Clone + 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	context: &Context<T>,
	options: ContextOptions,
) -> Result<ContextHandle<T>> {
	let provided = tree
		.find_provider(component, context.key())?
		.and_then(|payload| payload.downcast_ref::<State<T>>().cloned());

	let (state, is_default) = match provided {
		Some(state) => (state, false),
		None => {
			let consumer = tree.type_name(component)?;
			if options.required {
				return Err(ContextError::ContextNotFound {
					context: display_name(context.name()),
					consumer,
				});
			}
			let (state, created) = tree.default_cell(component, context.inner.id, || {
				context.make_cell(context.default_value().clone())
			})?;
			if created && tree.settings().warn_on_default_context() {
				tracing::warn!(
					context = context.name().unwrap_or("unnamed"),
					consumer,
					"no provider found; using the context default"
				);
			}
			(state, true)
		}
	};

	if options.subscribe {
		tree.subscribe(component, &state)?;
	}
	if let Some(name) = context.name() {
		tree.connect_effects(component, name.into(), &state)?;
	}
	Ok(ContextHandle { state, is_default })
}

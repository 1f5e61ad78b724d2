//! Reducer contexts: share one [`ReducerBinding`] with a subtree.
//!
//! Unlike a [`Context`](crate::Context), the provider does not wrap the
//! value in a new cell. Consumers receive the exact binding that was
//! provided, so dispatching from any consumer drives the same cell.

use core::fmt;
use core::marker::PhantomData;

use std::rc::Rc;

use ripple_reactive::{ComponentId, ReducerBinding};

use crate::context::next_context_id;
use crate::error::{ContextError, Result, display_name};
use crate::tree::{ComponentTree, ProviderKey};

/// Identity under which a reducer binding is provided.
pub struct ReducerContext<T: 'static, A: 'static> {
	id: u64,
	name: Option<Rc<str>>,
	_marker: PhantomData<fn() -> (T, A)>,
}

impl<T: 'static, A: 'static> Clone for ReducerContext<T, A> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			name: self.name.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T: 'static, A: 'static> ReducerContext<T, A> {
	/// Declare a reducer context
	pub fn new(name: Option<&str>) -> Self {
		Self {
			id: next_context_id(),
			name: name.map(Rc::from),
			_marker: PhantomData,
		}
	}

	/// Name of this reducer context
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	fn key(&self) -> ProviderKey {
		ProviderKey::ReducerContext(self.id)
	}
}

impl<T: 'static, A: 'static> fmt::Debug for ReducerContext<T, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReducerContext")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Declare a reducer context
pub fn create_reducer_context<T: 'static, A: 'static>(name: Option<&str>) -> ReducerContext<T, A> {
	ReducerContext::new(name)
}

impl ComponentTree {
	/// Mount a provider that hands `binding` to consumers of `context`.
	pub fn provide_reducer<T: 'static, A: 'static>(
		&self,
		parent: Option<ComponentId>,
		context: &ReducerContext<T, A>,
		binding: ReducerBinding<T, A>,
	) -> Result<ComponentId> {
		self.mount_provider(parent, "ReducerProvider", context.key(), Rc::new(binding))
	}
}

/// Resolve the binding provided for `context` above `component`.
///
/// When the binding's cell is named, `component`'s effect handlers for that
/// name are bound to it.
///
/// # Errors
///
/// [`ContextError::ReducerContextNotFound`] if no provider is mounted above
/// `component`; there is no default to fall back to.
pub fn use_reducer_context<T: 'static, A: 'static>(
	tree: &ComponentTree,
	component: ComponentId,
	context: &ReducerContext<T, A>,
	subscribe: bool,
) -> Result<ReducerBinding<T, A>> {
	let binding = tree
		.find_provider(component, context.key())?
		.and_then(|payload| payload.downcast_ref::<ReducerBinding<T, A>>().cloned());
	let Some(binding) = binding else {
		return Err(ContextError::ReducerContextNotFound {
			context: display_name(context.name()),
			consumer: tree.type_name(component)?,
		});
	};

	if subscribe {
		tree.subscribe(component, &binding)?;
	}
	if let Some(name) = binding.name() {
		tree.connect_effects(component, name.into(), &binding)?;
	}
	Ok(binding)
}

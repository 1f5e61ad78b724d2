//! The component seam between ripple and a host UI.

use core::any::Any;

use std::rc::Rc;

use ripple_reactive::{StateChanged, WatchHandle};

use crate::effects::{EffectTable, EffectTarget};
use crate::error::Result;

/// A component that can own cells, consume contexts and receive change
/// messages.
///
/// Everything has a default, so `impl Component for Widget {}` is enough for
/// a component that only reads state.
pub trait Component: 'static {
	/// Effect handlers for this component type.
	///
	/// Called once per type, the first time a component of the type is
	/// mounted. Only the handlers declared here apply to this type.
	fn effects() -> Result<EffectTable<Self>>
	where
		Self: Sized,
	{
		Ok(EffectTable::new())
	}

	/// Handle a change message for a cell this component subscribed to.
	///
	/// Runs from [`ComponentTree::deliver_pending`](crate::ComponentTree::deliver_pending),
	/// never from inside `set`. A message may arrive after the component
	/// unsubscribed from the cell.
	fn on_state_changed(&self, event: &StateChanged) {
		let _ = event;
	}

	/// Name used in diagnostics
	fn type_name(&self) -> &'static str {
		short_type_name::<Self>()
	}
}

/// `a::b::Widget<c::D>` becomes `Widget<c::D>`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
	let full = core::any::type_name::<T>();
	let end = full.find('<').unwrap_or(full.len());
	let start = full[..end].rfind("::").map_or(0, |i| i + 2);
	&full[start..]
}

/// Object-safe view of a mounted component.
pub(crate) trait ErasedComponent {
	fn on_state_changed(&self, event: &StateChanged);
	fn type_name(&self) -> &'static str;
	fn bind_effects(&self, target: &EffectTarget, cell: &dyn Any) -> Vec<WatchHandle>;
	fn as_any(&self) -> Rc<dyn Any>;
}

pub(crate) struct Mounted<C: Component> {
	component: Rc<C>,
	effects: Rc<EffectTable<C>>,
}

impl<C: Component> Mounted<C> {
	pub(crate) fn new(component: Rc<C>, effects: Rc<EffectTable<C>>) -> Self {
		Self { component, effects }
	}
}

impl<C: Component> ErasedComponent for Mounted<C> {
	fn on_state_changed(&self, event: &StateChanged) {
		self.component.on_state_changed(event);
	}

	fn type_name(&self) -> &'static str {
		self.component.type_name()
	}

	fn bind_effects(&self, target: &EffectTarget, cell: &dyn Any) -> Vec<WatchHandle> {
		if !self.effects.listens_to(target) {
			return Vec::new();
		}
		self.effects
			.bind(&Rc::downgrade(&self.component), target, cell)
	}

	fn as_any(&self) -> Rc<dyn Any> {
		self.component.clone()
	}
}

/// Built-in node standing in for a provider in the tree.
pub(crate) struct ProviderNode {
	label: &'static str,
}

impl ProviderNode {
	pub(crate) fn new(label: &'static str) -> Self {
		Self { label }
	}
}

impl Component for ProviderNode {
	fn type_name(&self) -> &'static str {
		self.label
	}
}

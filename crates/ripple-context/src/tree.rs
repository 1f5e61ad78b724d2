//! Component tree
//!
//! An arena of mounted components linked by parent ids. The tree is the only
//! thing context resolution needs from a host: "who is the parent of this
//! component". It also owns the mailbox that carries subscriber messages and
//! the per-component teardown lists that undo subscriptions and effect
//! bindings when a component unmounts.
//!
//! ## Ids
//!
//! [`ComponentId`]s pair a slot index with a generation. Unmounting frees the
//! slot and bumps its generation, so a stale id never resolves to the
//! component that later reuses the slot.
//!
//! ## Delivery
//!
//! Cells post [`StateChanged`](ripple_reactive::StateChanged) messages into
//! the tree's [`Mailbox`]. Nothing is delivered until the host calls
//! [`ComponentTree::deliver_pending`]. A host with its own event loop can
//! supply a [`DeliveryChannel`] through [`ComponentTree::with_channel`] and
//! feed messages back with [`ComponentTree::deliver`].

use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ripple_reactive::{
	CellId, ComponentId, ComponentRef, DeliveryChannel, Envelope, Mailbox, Settings, Source,
	State,
};

use crate::component::{Component, ErasedComponent, Mounted, ProviderNode};
use crate::effects::{EffectTarget, StoreId, effect_table};
use crate::error::{ContextError, Result};

/// Key under which a provider node is found by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ProviderKey {
	Context(u64),
	ReducerContext(u64),
	Store(StoreId),
}

struct Provided {
	key: ProviderKey,
	payload: Rc<dyn Any>,
}

struct Node {
	parent: Option<ComponentId>,
	children: Vec<ComponentId>,
	component: Rc<dyn ErasedComponent>,
	provided: Option<Provided>,
	teardown: Vec<Box<dyn FnOnce()>>,
	owned: Vec<Rc<dyn Any>>,
	defaults: HashMap<u64, Rc<dyn Any>>,
	bound: HashSet<(CellId, EffectTarget)>,
}

struct Slot {
	generation: u32,
	node: Option<Node>,
}

/// Arena of mounted components.
pub struct ComponentTree {
	slots: RefCell<Vec<Slot>>,
	free: RefCell<Vec<u32>>,
	mailbox: Mailbox,
	channel: Rc<dyn DeliveryChannel>,
	settings: Settings,
}

impl Default for ComponentTree {
	fn default() -> Self {
		Self::new()
	}
}

impl ComponentTree {
	/// Create an empty tree with default settings
	pub fn new() -> Self {
		Self::with_settings(Settings::default())
	}

	/// Create an empty tree
	pub fn with_settings(settings: Settings) -> Self {
		let mailbox = Mailbox::new();
		Self {
			slots: RefCell::new(Vec::new()),
			free: RefCell::new(Vec::new()),
			channel: Rc::new(mailbox.clone()),
			mailbox,
			settings,
		}
	}

	/// Create an empty tree whose subscriber messages go to `channel`.
	///
	/// The host owns delivery: it drains `channel` on its own schedule and
	/// hands each message back through [`ComponentTree::deliver`]. The
	/// built-in [`Mailbox`] stays empty, so [`ComponentTree::deliver_pending`]
	/// has nothing to do for such a tree.
	pub fn with_channel(settings: Settings, channel: Rc<dyn DeliveryChannel>) -> Self {
		Self {
			slots: RefCell::new(Vec::new()),
			free: RefCell::new(Vec::new()),
			channel,
			mailbox: Mailbox::new(),
			settings,
		}
	}

	/// Settings this tree was built with
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Queue of undelivered subscriber messages.
	///
	/// Always empty for a tree built with [`ComponentTree::with_channel`].
	pub fn mailbox(&self) -> &Mailbox {
		&self.mailbox
	}

	/// Mount `component` without a parent.
	///
	/// # Errors
	///
	/// Fails if the component type's effect table cannot be built.
	pub fn mount_root<C: Component>(&self, component: Rc<C>) -> Result<ComponentId> {
		self.mount_node(None, component, None)
	}

	/// Mount `component` as the last child of `parent`.
	///
	/// # Errors
	///
	/// [`ContextError::UnknownComponent`] if `parent` is not mounted, or the
	/// error returned by the type's [`Component::effects`].
	pub fn mount<C: Component>(&self, parent: ComponentId, component: Rc<C>) -> Result<ComponentId> {
		self.ensure_mounted(parent)?;
		self.mount_node(Some(parent), component, None)
	}

	/// Mount a provider node holding `payload` under `key`.
	pub(crate) fn mount_provider(
		&self,
		parent: Option<ComponentId>,
		label: &'static str,
		key: ProviderKey,
		payload: Rc<dyn Any>,
	) -> Result<ComponentId> {
		if let Some(parent) = parent {
			self.ensure_mounted(parent)?;
		}
		let id = self.mount_node(
			parent,
			Rc::new(ProviderNode::new(label)),
			Some(Provided { key, payload }),
		)?;
		tracing::debug!(provider = label, id = %id, parent = ?parent, "provider mounted");
		Ok(id)
	}

	fn mount_node<C: Component>(
		&self,
		parent: Option<ComponentId>,
		component: Rc<C>,
		provided: Option<Provided>,
	) -> Result<ComponentId> {
		let effects = effect_table::<C>()?;
		let node = Node {
			parent,
			children: Vec::new(),
			component: Rc::new(Mounted::new(component, effects)),
			provided,
			teardown: Vec::new(),
			owned: Vec::new(),
			defaults: HashMap::new(),
			bound: HashSet::new(),
		};

		let mut slots = self.slots.borrow_mut();
		let id = match self.free.borrow_mut().pop() {
			Some(index) => {
				let slot = &mut slots[index as usize];
				slot.node = Some(node);
				ComponentId::from_raw_parts(index, slot.generation)
			}
			None => {
				let index = slots.len() as u32;
				slots.push(Slot {
					generation: 0,
					node: Some(node),
				});
				ComponentId::from_raw_parts(index, 0)
			}
		};
		if let Some(parent) = parent
			&& let Some(parent) = node_mut(&mut slots, parent)
		{
			parent.children.push(id);
		}
		Ok(id)
	}

	/// Unmount `id` and its whole subtree.
	///
	/// Every removed component is unsubscribed from the cells it subscribed
	/// to and its effect watchers are removed. Cells owned by removed
	/// components and providers are released. Messages already queued for
	/// removed components are dropped at delivery.
	///
	/// Returns the number of removed components (0 if `id` was not mounted).
	pub fn unmount(&self, id: ComponentId) -> usize {
		let mut removed = Vec::new();
		{
			let mut slots = self.slots.borrow_mut();
			let Some(node) = node_ref(&slots, id) else {
				return 0;
			};
			let parent = node.parent;

			// Children first
			let mut stack = vec![id];
			let mut order = Vec::new();
			while let Some(current) = stack.pop() {
				order.push(current);
				if let Some(node) = node_ref(&slots, current) {
					stack.extend(node.children.iter().copied());
				}
			}
			for current in order.into_iter().rev() {
				let slot = &mut slots[current.index() as usize];
				if let Some(node) = slot.node.take() {
					slot.generation = slot.generation.wrapping_add(1);
					self.free.borrow_mut().push(current.index());
					removed.push((current, node));
				}
			}

			if let Some(parent) = parent
				&& let Some(parent) = node_mut(&mut slots, parent)
			{
				parent.children.retain(|child| *child != id);
			}
		}

		// Teardown runs with no borrow held: it may touch cells whose
		// watchers read the tree
		let count = removed.len();
		for (current, mut node) in removed {
			if node.provided.is_some() {
				tracing::debug!(provider = node.component.type_name(), id = %current, "provider unmounted");
			}
			for teardown in node.teardown.drain(..) {
				teardown();
			}
		}
		count
	}

	/// Returns true if `id` refers to a mounted component
	pub fn contains(&self, id: ComponentId) -> bool {
		node_ref(&self.slots.borrow(), id).is_some()
	}

	/// Number of mounted components, providers included
	pub fn len(&self) -> usize {
		self.slots
			.borrow()
			.iter()
			.filter(|slot| slot.node.is_some())
			.count()
	}

	/// Returns true if nothing is mounted
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Parent of `id`, if it has one
	pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
		node_ref(&self.slots.borrow(), id).and_then(|node| node.parent)
	}

	/// Children of `id`, in mount order
	pub fn children(&self, id: ComponentId) -> Vec<ComponentId> {
		node_ref(&self.slots.borrow(), id)
			.map(|node| node.children.clone())
			.unwrap_or_default()
	}

	/// Ancestors of `id`, nearest first, excluding `id` itself
	pub fn ancestors(&self, id: ComponentId) -> Vec<ComponentId> {
		let slots = self.slots.borrow();
		let mut out = Vec::new();
		let mut current = node_ref(&slots, id).and_then(|node| node.parent);
		while let Some(ancestor) = current {
			out.push(ancestor);
			current = node_ref(&slots, ancestor).and_then(|node| node.parent);
		}
		out
	}

	/// Diagnostic type name of `id`
	pub fn type_name(&self, id: ComponentId) -> Result<&'static str> {
		node_ref(&self.slots.borrow(), id)
			.map(|node| node.component.type_name())
			.ok_or(ContextError::UnknownComponent(id))
	}

	/// The mounted component `id`, if it is a `C`
	pub fn component<C: Component>(&self, id: ComponentId) -> Option<Rc<C>> {
		let component = node_ref(&self.slots.borrow(), id)?.component.clone();
		component.as_any().downcast::<C>().ok()
	}

	/// Reference used to subscribe `id` to cells
	pub fn component_ref(&self, id: ComponentId) -> Result<ComponentRef> {
		self.ensure_mounted(id)?;
		Ok(ComponentRef::new(id, self.channel.clone()))
	}

	/// Deliver queued messages to their recipients.
	///
	/// Messages are handed out oldest first. Messages posted by handlers
	/// during delivery are delivered in a later round of the same call, up to
	/// [`Settings::max_delivery_rounds`] rounds; anything left after that stays
	/// queued. Messages for unmounted components are dropped.
	///
	/// Returns the number of messages handed to a component.
	pub fn deliver_pending(&self) -> usize {
		let mut delivered = 0;
		for _ in 0..self.settings.max_delivery_rounds() {
			let batch = self.mailbox.take_all();
			if batch.is_empty() {
				return delivered;
			}
			for envelope in batch {
				if self.deliver(&envelope) {
					delivered += 1;
				}
			}
		}
		if !self.mailbox.is_empty() {
			tracing::warn!(
				rounds = self.settings.max_delivery_rounds(),
				pending = self.mailbox.len(),
				"delivery round limit reached; remaining messages stay queued"
			);
		}
		delivered
	}

	/// Hand one message to its recipient.
	///
	/// Returns false, dropping the message, if the recipient is no longer
	/// mounted.
	pub fn deliver(&self, envelope: &Envelope) -> bool {
		let recipient = node_ref(&self.slots.borrow(), envelope.recipient)
			.map(|node| node.component.clone());
		let Some(component) = recipient else {
			tracing::trace!(recipient = %envelope.recipient, "dropping message for unmounted component");
			return false;
		};
		if self.settings.trace_deliveries() {
			tracing::trace!(
				recipient = %envelope.recipient,
				component = component.type_name(),
				cell = ?envelope.event.cell(),
				name = ?envelope.event.name(),
				"delivering state change"
			);
		}
		component.on_state_changed(&envelope.event);
		true
	}

	/// Nearest provider for `key`, starting at `from` and walking up.
	pub(crate) fn find_provider(&self, from: ComponentId, key: ProviderKey) -> Result<Option<Rc<dyn Any>>> {
		let slots = self.slots.borrow();
		let mut current = Some(from);
		let mut first = true;
		while let Some(id) = current {
			let Some(node) = node_ref(&slots, id) else {
				if first {
					return Err(ContextError::UnknownComponent(from));
				}
				break;
			};
			first = false;
			if let Some(provided) = &node.provided
				&& provided.key == key
			{
				return Ok(Some(provided.payload.clone()));
			}
			current = node.parent;
		}
		Ok(None)
	}

	/// Payload of provider node `id` if it provides `key`
	pub(crate) fn provider_payload(&self, id: ComponentId, key: ProviderKey) -> Option<Rc<dyn Any>> {
		let slots = self.slots.borrow();
		let provided = node_ref(&slots, id)?.provided.as_ref()?;
		(provided.key == key).then(|| provided.payload.clone())
	}

	/// Keep `value` alive until `id` unmounts
	pub(crate) fn keep_alive(&self, id: ComponentId, value: Rc<dyn Any>) -> Result<()> {
		self.with_node(id, |node| node.owned.push(value))
	}

	/// Default-seeded cell that `id` holds for context `context`.
	///
	/// The first call builds the cell with `make` and keeps it until `id`
	/// unmounts; later calls return the same cell. The flag is true when the
	/// cell was built by this call.
	pub(crate) fn default_cell<T: 'static>(
		&self,
		id: ComponentId,
		context: u64,
		make: impl FnOnce() -> State<T>,
	) -> Result<(State<T>, bool)> {
		let cached = self.with_node(id, |node| {
			node.defaults
				.get(&context)
				.and_then(|cell| cell.downcast_ref::<State<T>>().cloned())
		})?;
		if let Some(state) = cached {
			return Ok((state, false));
		}
		// `make` may touch the tree, so it runs outside the borrow
		let state = make();
		let cell: Rc<dyn Any> = Rc::new(state.clone());
		self.with_node(id, |node| {
			node.defaults.insert(context, cell);
		})?;
		Ok((state, true))
	}

	/// Run `f` when `id` unmounts
	pub(crate) fn on_teardown(&self, id: ComponentId, f: impl FnOnce() + 'static) -> Result<()> {
		self.with_node(id, |node| node.teardown.push(Box::new(f)))
	}

	/// Subscribe `id` to `source` until it unmounts.
	///
	/// Subscribing an already subscribed component is a no-op.
	pub(crate) fn subscribe<S: Source>(&self, id: ComponentId, source: &S) -> Result<()> {
		let state = source.source_state();
		let component = self.component_ref(id)?;
		if state.is_subscribed(id) {
			return Ok(());
		}
		state.subscribe(component);
		let weak = state.downgrade();
		self.on_teardown(id, move || {
			if let Some(state) = weak.upgrade() {
				state.unsubscribe(id);
			}
		})
	}

	/// Bind `id`'s effect handlers for `target` onto `source`.
	///
	/// A given (cell, target) pair is bound at most once per component.
	/// Returns the number of handlers bound.
	pub(crate) fn connect_effects<S: Source>(
		&self,
		id: ComponentId,
		target: EffectTarget,
		source: &S,
	) -> Result<usize> {
		let state = source.source_state();
		let component = {
			let mut slots = self.slots.borrow_mut();
			let node = node_mut(&mut slots, id).ok_or(ContextError::UnknownComponent(id))?;
			if !node.bound.insert((state.id(), target.clone())) {
				return Ok(0);
			}
			node.component.clone()
		};

		let handles = component.bind_effects(&target, state);
		let count = handles.len();
		if count > 0 {
			tracing::debug!(
				component = component.type_name(),
				effect_target = %target,
				handlers = count,
				"effects bound"
			);
			self.on_teardown(id, move || {
				for handle in handles {
					handle.unwatch();
				}
			})?;
		}
		Ok(count)
	}

	fn ensure_mounted(&self, id: ComponentId) -> Result<()> {
		if self.contains(id) {
			Ok(())
		} else {
			Err(ContextError::UnknownComponent(id))
		}
	}

	#[cfg(test)]
	fn teardown_len(&self, id: ComponentId) -> usize {
		node_ref(&self.slots.borrow(), id).map_or(0, |node| node.teardown.len())
	}

	fn with_node<R>(&self, id: ComponentId, f: impl FnOnce(&mut Node) -> R) -> Result<R> {
		let mut slots = self.slots.borrow_mut();
		let node = node_mut(&mut slots, id).ok_or(ContextError::UnknownComponent(id))?;
		Ok(f(node))
	}
}

impl fmt::Debug for ComponentTree {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentTree")
			.field("mounted", &self.len())
			.field("pending", &self.mailbox.len())
			.finish()
	}
}

fn node_ref(slots: &[Slot], id: ComponentId) -> Option<&Node> {
	let slot = slots.get(id.index() as usize)?;
	if slot.generation != id.generation() {
		return None;
	}
	slot.node.as_ref()
}

fn node_mut(slots: &mut [Slot], id: ComponentId) -> Option<&mut Node> {
	let slot = slots.get_mut(id.index() as usize)?;
	if slot.generation != id.generation() {
		return None;
	}
	slot.node.as_mut()
}

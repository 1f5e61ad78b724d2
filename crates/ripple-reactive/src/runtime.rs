//! Reactive Runtime
//!
//! Identifiers and the asynchronous delivery channel shared by every cell.
//!
//! ## Architecture
//!
//! Ripple uses a push-based model with two notification paths:
//!
//! 1. **Watchers**: synchronous callbacks invoked by a cell while `set` is
//!    still on the stack, in registration order.
//! 2. **Subscribers**: components that receive a [`StateChanged`] message
//!    through a [`DeliveryChannel`]. Messages are queued, never delivered
//!    re-entrantly, so a mutation cannot recurse into a component's handler.
//!
//! The default channel is [`Mailbox`], a single FIFO queue. A single queue is
//! trivially FIFO per recipient; no ordering is promised across recipients.
//!
//! ## Example
//!
//! ```
//! use ripple_reactive::{ComponentId, ComponentRef, Mailbox, State};
//! use std::rc::Rc;
//!
//! let mailbox = Mailbox::new();
//! let widget = ComponentRef::new(ComponentId::from_raw_parts(0, 0), Rc::new(mailbox.clone()));
//!
//! let count = State::new(0);
//! count.subscribe(widget);
//! count.set(1);
//!
//! let envelope = mailbox.pop().unwrap();
//! assert_eq!(envelope.event.values::<i32>(), Some((&0, &1)));
//! ```

use core::any::Any;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use std::collections::VecDeque;
use std::rc::Rc;

/// Unique identifier for a cell (value cell, model cell or derivation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(usize);

impl CellId {
	/// Create a new unique CellId
	pub fn new() -> Self {
		static COUNTER: AtomicUsize = AtomicUsize::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

impl Default for CellId {
	fn default() -> Self {
		Self::new()
	}
}

/// Identifier of a component in the host tree.
///
/// The host allocates these; a generation counter distinguishes a reused
/// arena slot from the component that previously occupied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId {
	index: u32,
	generation: u32,
}

impl ComponentId {
	/// Build an id from an arena index and a slot generation.
	pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
		Self { index, generation }
	}

	/// Arena index of this component.
	pub const fn index(&self) -> u32 {
		self.index
	}

	/// Slot generation of this component.
	pub const fn generation(&self) -> u32 {
		self.generation
	}
}

impl fmt::Display for ComponentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}v{}", self.index, self.generation)
	}
}

/// Message posted to subscribed components when a cell accepts a change.
///
/// Produced exactly once per accepted mutation and shared (cheaply cloned)
/// between all subscribers of the cell.
#[derive(Clone)]
pub struct StateChanged {
	cell: CellId,
	name: Option<Rc<str>>,
	old: Rc<dyn Any>,
	new: Rc<dyn Any>,
}

impl StateChanged {
	pub(crate) fn new<T: 'static>(
		cell: CellId,
		name: Option<Rc<str>>,
		old: Rc<T>,
		new: Rc<T>,
	) -> Self {
		Self {
			cell,
			name,
			old,
			new,
		}
	}

	/// Id of the cell that changed.
	pub fn cell(&self) -> CellId {
		self.cell
	}

	/// Name of the cell that changed, if it has one.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns `(old, new)` if the cell holds values of type `T`.
	pub fn values<T: 'static>(&self) -> Option<(&T, &T)> {
		Some((self.old.downcast_ref::<T>()?, self.new.downcast_ref::<T>()?))
	}

	/// The previous value, if the cell holds values of type `T`.
	pub fn old_value<T: 'static>(&self) -> Option<&T> {
		self.old.downcast_ref::<T>()
	}

	/// The new value, if the cell holds values of type `T`.
	pub fn new_value<T: 'static>(&self) -> Option<&T> {
		self.new.downcast_ref::<T>()
	}
}

impl fmt::Debug for StateChanged {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateChanged")
			.field("cell", &self.cell)
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Host-provided asynchronous delivery channel.
///
/// Implementations must be FIFO per recipient. Delivery happens later, on the
/// host's schedule; `post` itself must not call into the recipient.
pub trait DeliveryChannel {
	/// Queue `event` for `recipient`.
	fn post(&self, recipient: ComponentId, event: StateChanged);
}

/// A queued message.
#[derive(Debug, Clone)]
pub struct Envelope {
	/// Component that should receive the event
	pub recipient: ComponentId,
	/// The change being announced
	pub event: StateChanged,
}

/// FIFO message queue used as the default [`DeliveryChannel`].
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct Mailbox {
	queue: Rc<RefCell<VecDeque<Envelope>>>,
}

impl Mailbox {
	/// Create an empty mailbox
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of queued messages
	pub fn len(&self) -> usize {
		self.queue.borrow().len()
	}

	/// Returns true if nothing is queued
	pub fn is_empty(&self) -> bool {
		self.queue.borrow().is_empty()
	}

	/// Remove and return the oldest message
	pub fn pop(&self) -> Option<Envelope> {
		self.queue.borrow_mut().pop_front()
	}

	/// Remove every message queued so far, oldest first.
	///
	/// Messages posted while the returned batch is being handled land in the
	/// (now empty) queue and are picked up by the next call.
	pub fn take_all(&self) -> Vec<Envelope> {
		self.queue.borrow_mut().drain(..).collect()
	}

	/// Discard all queued messages
	pub fn clear(&self) {
		self.queue.borrow_mut().clear();
	}
}

impl DeliveryChannel for Mailbox {
	fn post(&self, recipient: ComponentId, event: StateChanged) {
		self.queue
			.borrow_mut()
			.push_back(Envelope { recipient, event });
	}
}

impl fmt::Debug for Mailbox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mailbox")
			.field("pending", &self.len())
			.finish()
	}
}

/// Non-owning reference to a component: its id plus the channel used to
/// reach it.
///
/// Cells store these instead of the component itself, so a subscription
/// never keeps a component alive.
#[derive(Clone)]
pub struct ComponentRef {
	id: ComponentId,
	channel: Rc<dyn DeliveryChannel>,
}

impl ComponentRef {
	/// Create a reference to `id`, reachable through `channel`
	pub fn new(id: ComponentId, channel: Rc<dyn DeliveryChannel>) -> Self {
		Self { id, channel }
	}

	/// Id of the referenced component
	pub fn id(&self) -> ComponentId {
		self.id
	}

	pub(crate) fn post(&self, event: StateChanged) {
		self.channel.post(self.id, event);
	}
}

impl fmt::Debug for ComponentRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentRef").field(&self.id).finish()
	}
}

//! State - Value Cell
//!
//! `State<T>` holds one value, detects changes and notifies observers.
//!
//! ## Key Features
//!
//! - **Equality gating**: a candidate equal to the current value is dropped
//!   without calling watchers or posting messages.
//! - **Replace, never mutate**: the value lives behind an `Rc<T>` that is
//!   swapped on every accepted change. Watchers and messages hold the old and
//!   new `Rc`s, so nobody observes a value being edited in place.
//! - **Two observer kinds**: synchronous watchers (`watch`) and asynchronous
//!   subscribers (`subscribe`), see [`crate::runtime`].
//! - **Cheap handles**: `State<T>` is an `Rc` wrapper; clones share the cell.
//!
//! ## Example
//!
//! ```
//! use ripple_reactive::State;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let count = State::new(0);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = seen.clone();
//! let handle = count.watch(move |old, new| log.borrow_mut().push((*old, *new)));
//!
//! count.set(5);
//! count.set(5); // equal value: no-op
//! count.set_with(|n| n + 1);
//! assert_eq!(*seen.borrow(), vec![(0, 5), (5, 6)]);
//!
//! handle.unwatch();
//! count.set(0);
//! assert_eq!(seen.borrow().len(), 2);
//! ```

use core::cell::{Cell, RefCell};
use core::fmt;

use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::runtime::{CellId, ComponentId, ComponentRef, StateChanged};

/// Equality used to gate `set`.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> bool>;

type WatcherFn<T> = Rc<dyn Fn(&T, &T)>;

/// Identifier of a watcher registration, unique within its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatcherId(u64);

struct StateInner<T: 'static> {
	id: CellId,
	name: Option<Rc<str>>,
	value: RefCell<Rc<T>>,
	eq: Comparator<T>,
	watchers: RefCell<Vec<(WatcherId, WatcherFn<T>)>>,
	next_watcher: Cell<u64>,
	subscribers: RefCell<IndexMap<ComponentId, ComponentRef>>,
	notifying: Cell<bool>,
	pending: RefCell<VecDeque<(Rc<T>, Rc<T>)>>,
}

/// A mutable container of one value with change detection.
///
/// ## Cloning
///
/// `State<T>` implements `Clone`; all clones refer to the same cell.
pub struct State<T: 'static> {
	inner: Rc<StateInner<T>>,
}

impl<T: 'static> Clone for State<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: PartialEq + 'static> State<T> {
	/// Create an unnamed cell compared with `PartialEq`
	///
	/// # Example
	///
	/// ```
	/// use ripple_reactive::State;
	///
	/// let count = State::new(0);
	/// assert_eq!(count.get(), 0);
	/// ```
	pub fn new(value: T) -> Self {
		Self::with_name(value, None)
	}

	/// Create a cell with an optional name.
	///
	/// The name is what effect registrations match against.
	pub fn with_name(value: T, name: Option<&str>) -> Self {
		Self::with_comparator(value, name, Rc::new(|a: &T, b: &T| a == b))
	}
}

impl<T: 'static> State<T> {
	/// Create a cell that uses `eq` instead of `PartialEq` to detect changes.
	pub fn with_comparator(value: T, name: Option<&str>, eq: Comparator<T>) -> Self {
		Self {
			inner: Rc::new(StateInner {
				id: CellId::new(),
				name: name.map(Rc::from),
				value: RefCell::new(Rc::new(value)),
				eq,
				watchers: RefCell::new(Vec::new()),
				next_watcher: Cell::new(0),
				subscribers: RefCell::new(IndexMap::new()),
				notifying: Cell::new(false),
				pending: RefCell::new(VecDeque::new()),
			}),
		}
	}

	/// Id of this cell
	pub fn id(&self) -> CellId {
		self.inner.id
	}

	/// Name of this cell, if any
	pub fn name(&self) -> Option<&str> {
		self.inner.name.as_deref()
	}

	/// Get a clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		(*self.get_rc()).clone()
	}

	/// Get the current value without cloning it.
	///
	/// The returned `Rc` is a snapshot: later changes replace the cell's
	/// `Rc` and leave this one untouched.
	pub fn get_rc(&self) -> Rc<T> {
		self.inner.value.borrow().clone()
	}

	/// Read the current value through a closure
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		let current = self.get_rc();
		f(&current)
	}

	/// Set the cell to `value`.
	///
	/// Returns `true` if the value changed. An equal value is a no-op: no
	/// watcher runs and no message is posted.
	///
	/// A `set` made from a watcher of this cell commits at once, but its
	/// watchers and messages follow those of the change being notified, so
	/// observers see changes in commit order.
	pub fn set(&self, value: T) -> bool {
		self.commit(value)
	}

	/// Set the cell to `f(current)`.
	///
	/// `f` receives a snapshot of the current value; no borrow is held while
	/// it runs, so it may read this or any other cell. If `f` panics the cell
	/// keeps its previous value.
	pub fn set_with(&self, f: impl FnOnce(&T) -> T) -> bool {
		let current = self.get_rc();
		let next = f(&current);
		self.commit(next)
	}

	/// Like [`set_with`](Self::set_with) for updaters that can fail.
	///
	/// On `Err` the cell is left untouched and the error is returned as is.
	pub fn try_set_with<E>(&self, f: impl FnOnce(&T) -> Result<T, E>) -> Result<bool, E> {
		let current = self.get_rc();
		let next = f(&current)?;
		Ok(self.commit(next))
	}

	/// Register a synchronous callback receiving `(old, new)`.
	///
	/// Watchers run in registration order, before any subscriber message is
	/// posted. The returned handle removes exactly this registration.
	pub fn watch(&self, callback: impl Fn(&T, &T) + 'static) -> WatchHandle {
		let id = WatcherId(self.inner.next_watcher.get());
		self.inner.next_watcher.set(id.0 + 1);
		self.inner
			.watchers
			.borrow_mut()
			.push((id, Rc::new(callback)));

		let target: Weak<dyn Unwatch> = Rc::downgrade(&self.inner) as Weak<dyn Unwatch>;
		WatchHandle { target, id }
	}

	/// Number of registered watchers
	pub fn watcher_count(&self) -> usize {
		self.inner.watchers.borrow().len()
	}

	/// Subscribe a component to change messages.
	///
	/// Subscribing the same component twice keeps a single entry at its
	/// original position.
	pub fn subscribe(&self, component: ComponentRef) {
		self.inner
			.subscribers
			.borrow_mut()
			.entry(component.id())
			.or_insert(component);
	}

	/// Remove a component from the subscriber set.
	///
	/// Returns `true` if it was subscribed. Messages already posted are not
	/// recalled.
	pub fn unsubscribe(&self, component: ComponentId) -> bool {
		self.inner
			.subscribers
			.borrow_mut()
			.shift_remove(&component)
			.is_some()
	}

	/// Returns true if `component` is subscribed
	pub fn is_subscribed(&self, component: ComponentId) -> bool {
		self.inner.subscribers.borrow().contains_key(&component)
	}

	/// Number of subscribed components
	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.borrow().len()
	}

	/// Create a non-owning handle to this cell
	pub fn downgrade(&self) -> WeakState<T> {
		WeakState {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns true if both handles refer to the same cell
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	fn commit(&self, candidate: T) -> bool {
		let old = self.get_rc();
		if (self.inner.eq)(&old, &candidate) {
			tracing::trace!(cell = ?self.inner.id, name = ?self.inner.name, "value unchanged");
			return false;
		}

		let new = Rc::new(candidate);
		*self.inner.value.borrow_mut() = new.clone();
		tracing::trace!(cell = ?self.inner.id, name = ?self.inner.name, "value replaced");
		self.inner.pending.borrow_mut().push_back((old, new));

		// A commit from inside a watcher is drained by the outer call
		if self.inner.notifying.replace(true) {
			return true;
		}
		let _guard = NotifyingGuard(&self.inner.notifying);
		loop {
			let next = self.inner.pending.borrow_mut().pop_front();
			let Some((old, new)) = next else {
				break;
			};
			self.notify(old, new);
		}
		true
	}

	fn notify(&self, old: Rc<T>, new: Rc<T>) {
		// Snapshot so callbacks may watch, unwatch or set re-entrantly
		let watchers: Vec<WatcherFn<T>> = self
			.inner
			.watchers
			.borrow()
			.iter()
			.map(|(_, watcher)| watcher.clone())
			.collect();
		for watcher in &watchers {
			watcher(&old, &new);
		}

		let subscribers: Vec<ComponentRef> =
			self.inner.subscribers.borrow().values().cloned().collect();
		if !subscribers.is_empty() {
			let event = StateChanged::new(self.inner.id, self.inner.name.clone(), old, new);
			for subscriber in &subscribers {
				subscriber.post(event.clone());
			}
		}
	}
}

/// Clears the notifying flag even if a watcher panics.
struct NotifyingGuard<'a>(&'a Cell<bool>);

impl Drop for NotifyingGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for State<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut out = f.debug_struct("State");
		out.field("value", &*self.get_rc());
		if let Some(name) = self.name() {
			out.field("name", &name);
		}
		out.finish()
	}
}

/// Non-owning handle to a [`State`].
pub struct WeakState<T: 'static> {
	inner: Weak<StateInner<T>>,
}

impl<T: 'static> Clone for WeakState<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: 'static> WeakState<T> {
	/// Recover a strong handle if the cell is still alive
	pub fn upgrade(&self) -> Option<State<T>> {
		self.inner.upgrade().map(|inner| State { inner })
	}
}

trait Unwatch {
	fn remove_watcher(&self, id: WatcherId) -> bool;
}

impl<T: 'static> Unwatch for StateInner<T> {
	fn remove_watcher(&self, id: WatcherId) -> bool {
		let mut watchers = self.watchers.borrow_mut();
		match watchers.iter().position(|(candidate, _)| *candidate == id) {
			Some(index) => {
				watchers.remove(index);
				true
			}
			None => false,
		}
	}
}

/// Removes one watcher registration.
///
/// Removal is by registration id, so calling [`unwatch`](Self::unwatch)
/// twice is harmless and never removes a watcher registered later. Dropping
/// the handle does *not* remove the watcher.
pub struct WatchHandle {
	target: Weak<dyn Unwatch>,
	id: WatcherId,
}

impl WatchHandle {
	/// Id of the registration this handle removes
	pub fn id(&self) -> WatcherId {
		self.id
	}

	/// Remove the watcher. Returns `true` if it was still registered.
	pub fn unwatch(&self) -> bool {
		match self.target.upgrade() {
			Some(target) => target.remove_watcher(self.id),
			None => false,
		}
	}
}

impl fmt::Debug for WatchHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WatchHandle")
			.field("id", &self.id)
			.field("alive", &(self.target.strong_count() > 0))
			.finish()
	}
}

//! Derived - Computed Cells
//!
//! A `Derived<T>` is a read-only cell whose value is computed from one or
//! more source cells by a pure selector.
//!
//! ## How It Works
//!
//! 1. The selector runs once at creation over the current source values.
//! 2. A watcher is attached to every source.
//! 3. When any source changes, *all* sources are re-read and the selector
//!    re-applied, so a multi-source selector never mixes fresh and stale
//!    inputs.
//! 4. The result goes through the derivation's own equality-gated `set`:
//!    if it equals the previous result nothing downstream runs.
//!
//! Derivations are sources themselves, so they chain.
//!
//! ## Example
//!
//! ```
//! use ripple_reactive::{Derived, State};
//!
//! let a = State::new(3);
//! let b = State::new(4);
//! let sum = Derived::new((a.clone(), b.clone()), |(x, y)| x + y);
//! assert_eq!(sum.get(), 7);
//!
//! a.set(10);
//! assert_eq!(sum.get(), 14);
//! b.set(20);
//! assert_eq!(sum.get(), 30);
//! ```
//!
//! ## Lifetime
//!
//! Source watchers hold the derivation weakly. Once every `Derived` handle is
//! dropped the derivation detaches from its sources and stops recomputing.

use core::cell::RefCell;
use core::fmt;

use std::rc::{Rc, Weak};

use crate::model::{Model, ModelState};
use crate::reducer::ReducerBinding;
use crate::runtime::{CellId, ComponentId, ComponentRef};
use crate::state::{State, WatchHandle};

/// Anything backed by a cell that can feed a derivation.
pub trait Source: Clone + 'static {
	/// Type of the observed value
	type Value: 'static;

	/// The cell observed by derivations.
	fn source_state(&self) -> &State<Self::Value>;
}

impl<T: 'static> Source for State<T> {
	type Value = T;

	fn source_state(&self) -> &State<T> {
		self
	}
}

impl<S: Model> Source for ModelState<S> {
	type Value = S;

	fn source_state(&self) -> &State<S> {
		self.state()
	}
}

impl<T: 'static, A: 'static> Source for ReducerBinding<T, A> {
	type Value = T;

	fn source_state(&self) -> &State<T> {
		self.state()
	}
}

impl<T: 'static> Source for Derived<T> {
	type Value = T;

	fn source_state(&self) -> &State<T> {
		&self.inner.state
	}
}

/// An ordered set of sources.
///
/// Implemented for tuples of up to six [`Source`]s (possibly of different
/// types) and for `Vec<S>`. Order is fixed at creation and is the order of
/// the values handed to the selector.
pub trait Sources: 'static {
	/// Snapshot passed to the selector
	type Values;

	/// Read every source's current value
	fn snapshot(&self) -> Self::Values;

	/// Attach `on_change` to every source
	fn watch_each(&self, on_change: &Rc<dyn Fn()>) -> Vec<WatchHandle>;
}

fn watch_source<S: Source>(source: &S, on_change: &Rc<dyn Fn()>) -> WatchHandle {
	let notify = on_change.clone();
	source.source_state().watch(move |_, _| notify())
}

macro_rules! impl_sources_for_tuple {
	($($name:ident : $idx:tt),+) => {
		impl<$($name: Source),+> Sources for ($($name,)+)
		where
			$(<$name as Source>::Value: Clone,)+
		{
			type Values = ($(<$name as Source>::Value,)+);

			fn snapshot(&self) -> Self::Values {
				($(self.$idx.source_state().get(),)+)
			}

			fn watch_each(&self, on_change: &Rc<dyn Fn()>) -> Vec<WatchHandle> {
				vec![$(watch_source(&self.$idx, on_change)),+]
			}
		}
	};
}

impl_sources_for_tuple!(A: 0);
impl_sources_for_tuple!(A: 0, B: 1);
impl_sources_for_tuple!(A: 0, B: 1, C: 2);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_sources_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

impl<S: Source> Sources for Vec<S>
where
	S::Value: Clone,
{
	type Values = Vec<S::Value>;

	fn snapshot(&self) -> Self::Values {
		self.iter().map(|source| source.source_state().get()).collect()
	}

	fn watch_each(&self, on_change: &Rc<dyn Fn()>) -> Vec<WatchHandle> {
		self.iter()
			.map(|source| watch_source(source, on_change))
			.collect()
	}
}

struct DerivedInner<T: 'static> {
	state: State<T>,
	recompute: Box<dyn Fn() -> T>,
	source_watches: RefCell<Vec<WatchHandle>>,
}

impl<T: 'static> DerivedInner<T> {
	fn refresh(&self) {
		let next = (self.recompute)();
		self.state.set(next);
	}
}

impl<T: 'static> Drop for DerivedInner<T> {
	fn drop(&mut self) {
		for handle in self.source_watches.get_mut().drain(..) {
			handle.unwatch();
		}
	}
}

/// A read-only cell computed from other cells.
pub struct Derived<T: 'static> {
	inner: Rc<DerivedInner<T>>,
}

impl<T: 'static> Clone for Derived<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: PartialEq + 'static> Derived<T> {
	/// Derive an unnamed cell from `sources`
	pub fn new<S: Sources>(sources: S, selector: impl Fn(S::Values) -> T + 'static) -> Self {
		Self::with_name(sources, None, selector)
	}

	/// Derive a cell from `sources` with an optional name.
	///
	/// The name makes the derivation an effect target like any other cell.
	pub fn with_name<S: Sources>(
		sources: S,
		name: Option<&str>,
		selector: impl Fn(S::Values) -> T + 'static,
	) -> Self {
		let sources = Rc::new(sources);
		let reader = sources.clone();
		Self::build(
			name,
			move || selector(reader.snapshot()),
			move |on_change| sources.watch_each(on_change),
		)
	}

	/// Derive from a single source, reading its value by reference.
	///
	/// Named like [`Derived::with_name`].
	pub fn from_source<S: Source>(
		source: S,
		name: Option<&str>,
		selector: impl Fn(&S::Value) -> T + 'static,
	) -> Self {
		let reader = source.clone();
		Self::build(
			name,
			move || reader.source_state().with(|value| selector(value)),
			move |on_change| vec![watch_source(&source, on_change)],
		)
	}

	fn build(
		name: Option<&str>,
		recompute: impl Fn() -> T + 'static,
		attach: impl FnOnce(&Rc<dyn Fn()>) -> Vec<WatchHandle>,
	) -> Self {
		let state = State::with_name(recompute(), name);
		let inner = Rc::new_cyclic(|weak: &Weak<DerivedInner<T>>| {
			let weak = weak.clone();
			let on_change: Rc<dyn Fn()> = Rc::new(move || {
				if let Some(inner) = weak.upgrade() {
					inner.refresh();
				}
			});
			DerivedInner {
				state,
				recompute: Box::new(recompute),
				source_watches: RefCell::new(attach(&on_change)),
			}
		});
		Self { inner }
	}
}

impl<T: 'static> Derived<T> {
	/// Id of the derived cell
	pub fn id(&self) -> CellId {
		self.inner.state.id()
	}

	/// Name of the derived cell
	pub fn name(&self) -> Option<&str> {
		self.inner.state.name()
	}

	/// Clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.inner.state.get()
	}

	/// Current value without cloning
	pub fn get_rc(&self) -> Rc<T> {
		self.inner.state.get_rc()
	}

	/// Register a synchronous callback, see [`State::watch`]
	pub fn watch(&self, callback: impl Fn(&T, &T) + 'static) -> WatchHandle {
		self.inner.state.watch(callback)
	}

	/// Subscribe a component to change messages
	pub fn subscribe(&self, component: ComponentRef) {
		self.inner.state.subscribe(component);
	}

	/// Remove a component from the subscriber set
	pub fn unsubscribe(&self, component: ComponentId) -> bool {
		self.inner.state.unsubscribe(component)
	}

	/// Number of sources still attached
	pub fn source_count(&self) -> usize {
		self.inner.source_watches.borrow().len()
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Derived<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut out = f.debug_struct("Derived");
		out.field("value", &*self.get_rc());
		if let Some(name) = self.name() {
			out.field("name", &name);
		}
		out.field("sources", &self.source_count());
		out.finish()
	}
}

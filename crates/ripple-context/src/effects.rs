//! Effect tables
//!
//! An effect table maps a component type to the handlers it wants invoked
//! when a particular cell changes. Tables are declared once per type through
//! [`Component::effects`] and built lazily the first time a component of
//! that type is mounted, then cached for the rest of the thread's life.
//!
//! A handler fires for a cell only when the cell becomes associated with a
//! component instance: created by one of its hooks, or resolved from a
//! context or store. Cells the component never touches are never bound.
//!
//! ## Example
//!
//! ```
//! use ripple_context::{Component, ContextError, EffectTable};
//! use std::cell::RefCell;
//!
//! #[derive(Default)]
//! struct Counter {
//! 	log: RefCell<Vec<String>>,
//! }
//!
//! impl Component for Counter {
//! 	fn effects() -> Result<EffectTable<Self>, ContextError> {
//! 		EffectTable::new().register(["count"], |this: &Self, old: &i32, new: &i32| {
//! 			this.log.borrow_mut().push(format!("{old} -> {new}"));
//! 		})
//! 	}
//! }
//! ```

use core::any::{Any, TypeId};
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use ripple_reactive::{State, WatchHandle, warn_log};

use crate::component::{Component, short_type_name};
use crate::error::{ContextError, Result};

/// Identity of a [`Store`](crate::Store) declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreId(u64);

impl StoreId {
	pub(crate) fn new() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

/// What an effect handler listens to.
///
/// Names match by string equality against the cell's name. Stores match by
/// identity: two stores with the same name are different targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EffectTarget {
	/// Cell with this name
	Name(String),
	/// Cell provided for this store
	Store(StoreId),
}

impl From<&str> for EffectTarget {
	fn from(name: &str) -> Self {
		Self::Name(name.to_string())
	}
}

impl From<String> for EffectTarget {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

impl From<StoreId> for EffectTarget {
	fn from(id: StoreId) -> Self {
		Self::Store(id)
	}
}

impl fmt::Display for EffectTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Name(name) => write!(f, "\"{}\"", name),
			Self::Store(id) => write!(f, "store#{}", id.0),
		}
	}
}

type Binder<C> = Rc<dyn Fn(&Weak<C>, &dyn Any) -> Option<WatchHandle>>;

struct EffectEntry<C> {
	targets: Vec<EffectTarget>,
	value_type: &'static str,
	binder: Binder<C>,
}

/// Ordered list of `(targets, handler)` pairs for one component type.
pub struct EffectTable<C> {
	entries: Vec<EffectEntry<C>>,
}

impl<C: Component> Default for EffectTable<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C: Component> EffectTable<C> {
	/// Create an empty table
	pub fn new() -> Self {
		Self {
			entries: Vec::new(),
		}
	}

	/// Add a handler invoked with `(component, old, new)` whenever a cell
	/// matching one of `targets` changes.
	///
	/// `T` is the value type of the targeted cells. A cell of another type
	/// that matches by name is skipped with a warning when bound.
	///
	/// # Errors
	///
	/// [`ContextError::EffectRegistration`] if `targets` is empty.
	pub fn register<T, I>(mut self, targets: I, handler: impl Fn(&C, &T, &T) + 'static) -> Result<Self>
	where
		T: 'static,
		I: IntoIterator,
		I::Item: Into<EffectTarget>,
	{
		let targets: Vec<EffectTarget> = targets.into_iter().map(Into::into).collect();
		if targets.is_empty() {
			return Err(ContextError::EffectRegistration {
				component: short_type_name::<C>(),
			});
		}

		let handler = Rc::new(handler);
		let binder: Binder<C> = Rc::new(move |component: &Weak<C>, cell: &dyn Any| {
			let state = cell.downcast_ref::<State<T>>()?;
			let component = component.clone();
			let handler = handler.clone();
			Some(state.watch(move |old, new| {
				if let Some(component) = component.upgrade() {
					handler(&*component, old, new);
				}
			}))
		});

		self.entries.push(EffectEntry {
			targets,
			value_type: core::any::type_name::<T>(),
			binder,
		});
		Ok(self)
	}

	/// Number of registered handlers
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if no handler is registered
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns true if any handler listens to `target`
	pub fn listens_to(&self, target: &EffectTarget) -> bool {
		self.entries
			.iter()
			.any(|entry| entry.targets.contains(target))
	}

	/// Bind every handler listening to `target` onto `cell`.
	///
	/// `cell` must be a `&State<T>`; entries expecting another value type are
	/// skipped.
	pub(crate) fn bind(
		&self,
		component: &Weak<C>,
		target: &EffectTarget,
		cell: &dyn Any,
	) -> Vec<WatchHandle> {
		let mut handles = Vec::new();
		for entry in self.entries.iter().filter(|e| e.targets.contains(target)) {
			match (entry.binder)(component, cell) {
				Some(handle) => handles.push(handle),
				None => warn_log!(
					"effect handler on {} for {} skipped: cell does not hold `{}`",
					short_type_name::<C>(),
					target,
					entry.value_type
				),
			}
		}
		handles
	}
}

impl<C> fmt::Debug for EffectTable<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.entries.iter().map(|e| &e.targets))
			.finish()
	}
}

// Effect tables, built once per component type
thread_local! {
	static EFFECT_TABLES: RefCell<HashMap<TypeId, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// The cached table for `C`, building it on first use.
///
/// Build failures are not cached; the next mount retries.
pub(crate) fn effect_table<C: Component>() -> Result<Rc<EffectTable<C>>> {
	let key = TypeId::of::<C>();
	let cached = EFFECT_TABLES.with(|tables| tables.borrow().get(&key).cloned());
	if let Some(table) = cached.and_then(|table| table.downcast::<EffectTable<C>>().ok()) {
		return Ok(table);
	}

	// Built outside the borrow: `effects()` may mount or inspect other types
	let table = Rc::new(C::effects()?);
	tracing::debug!(
		component = short_type_name::<C>(),
		handlers = table.len(),
		"effect table built"
	);
	EFFECT_TABLES.with(|tables| {
		tables
			.borrow_mut()
			.insert(key, table.clone() as Rc<dyn Any>);
	});
	Ok(table)
}

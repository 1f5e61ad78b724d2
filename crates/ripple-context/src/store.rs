//! Stores: a reducer, an initial value and a context in one declaration.
//!
//! A [`Store`] is declared once and mounted any number of times. Each
//! [`Store::provider`] call instantiates its own cell and dispatcher, so two
//! providers of the same store never share state.
//!
//! ```
//! use ripple_context::{Component, ComponentTree, create_store};
//! use std::rc::Rc;
//!
//! struct List;
//! impl Component for List {}
//!
//! let todos = create_store(|items: &Vec<String>, item: &String| {
//! 	let mut next = items.clone();
//! 	next.push(item.clone());
//! 	next
//! }, Vec::new(), Some("todos"));
//!
//! let tree = ComponentTree::new();
//! let provider = todos.provider(&tree, None).unwrap();
//! let list = tree.mount(provider, Rc::new(List)).unwrap();
//!
//! let handle = todos.use_store(&tree, list, true).unwrap();
//! handle.dispatch("write docs".to_string());
//! assert_eq!(handle.get(), vec!["write docs".to_string()]);
//! ```

use core::fmt;

use std::rc::Rc;

use ripple_reactive::{ComponentId, Model, ReducerBinding, Source, State};

use crate::context::{CellFactory, model_cell};
use crate::effects::{EffectTarget, StoreId};
use crate::error::{ContextError, Result, display_name};
use crate::tree::{ComponentTree, ProviderKey};

type Transition<T, A> = Rc<dyn Fn(&T, &A) -> T>;

struct StoreInner<T: 'static, A> {
	id: StoreId,
	initial: T,
	name: Option<String>,
	transition: Transition<T, A>,
	make_cell: CellFactory<T>,
}

/// A reusable reducer declaration.
///
/// Clones share the identity, so effect handlers registered for one clone
/// match providers created from another.
pub struct Store<T: 'static, A: 'static> {
	inner: Rc<StoreInner<T, A>>,
}

impl<T: 'static, A: 'static> Clone for Store<T, A> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Clone + PartialEq + 'static, A: 'static> Store<T, A> {
	/// Declare a store over plain values
	pub fn new(initial: T, name: Option<&str>, transition: impl Fn(&T, &A) -> T + 'static) -> Self {
		Self::with_factory(initial, name, Rc::new(transition), State::with_name)
	}
}

impl<T: Model, A: 'static> Store<T, A> {
	/// Declare a store whose cells compare models by field map
	pub fn model(initial: T, name: Option<&str>, transition: impl Fn(&T, &A) -> T + 'static) -> Self {
		Self::with_factory(initial, name, Rc::new(transition), model_cell::<T>)
	}
}

impl<T: Clone + 'static, A: 'static> Store<T, A> {
	fn with_factory(
		initial: T,
		name: Option<&str>,
		transition: Transition<T, A>,
		make_cell: CellFactory<T>,
	) -> Self {
		Self {
			inner: Rc::new(StoreInner {
				id: StoreId::new(),
				initial,
				name: name.map(str::to_string),
				transition,
				make_cell,
			}),
		}
	}

	/// Identity of this store
	pub fn id(&self) -> StoreId {
		self.inner.id
	}

	/// Name of this store
	pub fn name(&self) -> Option<&str> {
		self.inner.name.as_deref()
	}

	/// Value every provider starts from
	pub fn initial(&self) -> &T {
		&self.inner.initial
	}

	/// Effect target matching this store
	pub fn target(&self) -> EffectTarget {
		EffectTarget::Store(self.inner.id)
	}

	/// Mount a provider with a fresh cell and dispatcher.
	pub fn provider(&self, tree: &ComponentTree, parent: Option<ComponentId>) -> Result<ComponentId> {
		let state = (self.inner.make_cell)(self.inner.initial.clone(), self.name());
		let transition = self.inner.transition.clone();
		let binding = ReducerBinding::from_state(state, move |current: &T, action: &A| {
			transition(current, action)
		});
		tree.mount_provider(parent, "StoreProvider", self.key(), Rc::new(binding))
	}

	/// The binding held by provider `provider`, if it belongs to this store
	pub fn provided(&self, tree: &ComponentTree, provider: ComponentId) -> Option<StoreHandle<T, A>> {
		let binding = tree
			.provider_payload(provider, self.key())?
			.downcast_ref::<ReducerBinding<T, A>>()
			.cloned()?;
		Some(StoreHandle {
			binding,
			store: self.clone(),
		})
	}

	/// Resolve the nearest provider of this store above `component`.
	///
	/// Binds `component`'s effect handlers targeting this store.
	///
	/// # Errors
	///
	/// [`ContextError::StoreNotFound`] if no provider is mounted above
	/// `component`.
	pub fn use_store(
		&self,
		tree: &ComponentTree,
		component: ComponentId,
		subscribe: bool,
	) -> Result<StoreHandle<T, A>> {
		let binding = tree
			.find_provider(component, self.key())?
			.and_then(|payload| payload.downcast_ref::<ReducerBinding<T, A>>().cloned());
		let Some(binding) = binding else {
			return Err(ContextError::StoreNotFound {
				store: display_name(self.name()),
				consumer: tree.type_name(component)?,
			});
		};

		if subscribe {
			tree.subscribe(component, &binding)?;
		}
		tree.connect_effects(component, self.target(), &binding)?;
		Ok(StoreHandle {
			binding,
			store: self.clone(),
		})
	}

	fn key(&self) -> ProviderKey {
		ProviderKey::Store(self.inner.id)
	}
}

impl<T: 'static, A: 'static> From<&Store<T, A>> for EffectTarget {
	fn from(store: &Store<T, A>) -> Self {
		EffectTarget::Store(store.inner.id)
	}
}

impl<T: fmt::Debug + 'static, A: 'static> fmt::Debug for Store<T, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store")
			.field("id", &self.inner.id)
			.field("name", &self.inner.name)
			.field("initial", &self.inner.initial)
			.finish_non_exhaustive()
	}
}

/// Declare a store over plain values
pub fn create_store<T: Clone + PartialEq + 'static, A: 'static>(
	transition: impl Fn(&T, &A) -> T + 'static,
	initial: T,
	name: Option<&str>,
) -> Store<T, A> {
	Store::new(initial, name, transition)
}

/// A consumer's view of one store provider.
pub struct StoreHandle<T: 'static, A: 'static> {
	binding: ReducerBinding<T, A>,
	store: Store<T, A>,
}

impl<T: 'static, A: 'static> Clone for StoreHandle<T, A> {
	fn clone(&self) -> Self {
		Self {
			binding: self.binding.clone(),
			store: self.store.clone(),
		}
	}
}

impl<T: 'static, A: 'static> StoreHandle<T, A> {
	/// Clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.binding.state().get()
	}

	/// Current value without cloning
	pub fn get_rc(&self) -> Rc<T> {
		self.binding.state().get_rc()
	}

	/// Dispatch `action` to this provider's reducer
	pub fn dispatch(&self, action: A) -> bool {
		self.binding.dispatch(action)
	}

	/// This provider's cell
	pub fn state(&self) -> &State<T> {
		self.binding.state()
	}

	/// This provider's binding
	pub fn binding(&self) -> &ReducerBinding<T, A> {
		&self.binding
	}

	/// The store declaration
	pub fn store(&self) -> &Store<T, A> {
		&self.store
	}
}

impl<T: 'static, A: 'static> Source for StoreHandle<T, A> {
	type Value = T;

	fn source_state(&self) -> &State<T> {
		self.binding.state()
	}
}

impl<T: fmt::Debug + 'static, A: 'static> fmt::Debug for StoreHandle<T, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StoreHandle")
			.field("value", &*self.get_rc())
			.field("store", &self.store.inner.name)
			.finish()
	}
}

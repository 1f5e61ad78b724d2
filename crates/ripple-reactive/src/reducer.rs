//! Reducer bindings: a cell driven by a pure transition function.

use core::fmt;

use std::rc::Rc;

use crate::model::{Model, model_state};
use crate::state::State;

type Transition<T, A> = Rc<dyn Fn(&T, &A) -> T>;

/// Pairs a cell with a pure `(state, action) -> state` transition.
///
/// `dispatch` always reads the cell's current value, so a binding captured
/// in a closure never works from a stale snapshot. The result goes through
/// the cell's equality gate; a transition returning an equal value (e.g. the
/// fallback arm for an unknown action) produces no change.
///
/// # Example
///
/// ```
/// use ripple_reactive::ReducerBinding;
///
/// enum Action {
/// 	Increment,
/// 	Reset,
/// }
///
/// let counter = ReducerBinding::new(0, |count: &i32, action: &Action| match action {
/// 	Action::Increment => count + 1,
/// 	Action::Reset => 0,
/// });
///
/// counter.dispatch(Action::Increment);
/// counter.dispatch(Action::Increment);
/// assert_eq!(counter.get(), 2);
///
/// counter.dispatch(Action::Reset);
/// assert_eq!(counter.get(), 0);
/// ```
pub struct ReducerBinding<T: 'static, A: 'static> {
	state: State<T>,
	transition: Transition<T, A>,
}

impl<T: 'static, A: 'static> Clone for ReducerBinding<T, A> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
			transition: self.transition.clone(),
		}
	}
}

impl<T: PartialEq + 'static, A: 'static> ReducerBinding<T, A> {
	/// Create a binding over a fresh unnamed cell
	pub fn new(initial: T, transition: impl Fn(&T, &A) -> T + 'static) -> Self {
		Self::with_name(initial, None, transition)
	}

	/// Create a binding over a fresh cell with an optional name
	pub fn with_name(
		initial: T,
		name: Option<&str>,
		transition: impl Fn(&T, &A) -> T + 'static,
	) -> Self {
		Self::from_state(State::with_name(initial, name), transition)
	}
}

impl<T: Model, A: 'static> ReducerBinding<T, A> {
	/// Create a binding whose cell compares models by field map.
	pub fn model(
		initial: T,
		name: Option<&str>,
		transition: impl Fn(&T, &A) -> T + 'static,
	) -> Self {
		Self::from_state(model_state(initial, name), transition)
	}
}

impl<T: 'static, A: 'static> ReducerBinding<T, A> {
	/// Bind `transition` to an existing cell.
	pub fn from_state(state: State<T>, transition: impl Fn(&T, &A) -> T + 'static) -> Self {
		Self {
			state,
			transition: Rc::new(transition),
		}
	}

	/// Apply `action` to the current value.
	///
	/// Returns `true` if the value changed. A panicking transition leaves the
	/// cell untouched.
	pub fn dispatch(&self, action: A) -> bool {
		let current = self.state.get_rc();
		let next = (self.transition)(&current, &action);
		tracing::trace!(cell = ?self.state.id(), name = ?self.state.name(), "dispatch");
		self.state.set(next)
	}

	/// Clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.state.get()
	}

	/// The bound cell
	pub fn state(&self) -> &State<T> {
		&self.state
	}

	/// Name of the bound cell
	pub fn name(&self) -> Option<&str> {
		self.state.name()
	}

	/// Returns true if both bindings drive the same cell
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.state.ptr_eq(&other.state) && Rc::ptr_eq(&self.transition, &other.transition)
	}
}

impl<T: fmt::Debug + 'static, A: 'static> fmt::Debug for ReducerBinding<T, A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReducerBinding")
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

//! Model cells: structured values with field-level updates.
//!
//! A *model* is any value that serializes to a record of named fields. Model
//! cells compare values by their normalized field maps rather than by
//! `PartialEq`, and accept partial updates that override a subset of fields.
//!
//! ```
//! use ripple_reactive::{FieldPatch, ModelState};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Profile {
//! 	name: String,
//! 	age: u32,
//! }
//!
//! let profile = ModelState::new(Profile { name: "Ada".into(), age: 36 });
//! let changed = profile.update(FieldPatch::new().field("age", 37)).unwrap();
//! assert!(changed);
//! assert_eq!(profile.get().age, 37);
//! ```

use core::fmt;
use core::ops::Deref;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ReactiveError, Result};
use crate::state::State;

/// Normalized representation of a model: field name to JSON value.
pub type FieldMap = serde_json::Map<String, Value>;

/// Capability required from structured values held by model cells.
///
/// Implemented for every `Clone + PartialEq + Serialize + DeserializeOwned`
/// type. Types that do not serialize to a map (numbers, sequences) are
/// rejected by [`fields`](Self::fields) with [`ReactiveError::NotAModel`].
pub trait Model: Clone + PartialEq + Serialize + DeserializeOwned + 'static {
	/// Normalized field map of this value
	fn fields(&self) -> Result<FieldMap> {
		match serde_json::to_value(self) {
			Ok(Value::Object(map)) => Ok(map),
			_ => Err(ReactiveError::NotAModel {
				type_name: core::any::type_name::<Self>(),
			}),
		}
	}

	/// Copy of this value with the fields in `patch` overridden.
	///
	/// Fields the model does not declare are rejected; a value of the wrong
	/// shape is reported against the patched field names.
	fn with_fields(&self, patch: &FieldMap) -> Result<Self> {
		let mut fields = self.fields()?;
		for (field, value) in patch {
			match fields.get_mut(field) {
				Some(slot) => *slot = value.clone(),
				None => {
					return Err(ReactiveError::InvalidFieldPatch {
						field: field.clone(),
						reason: "unknown field".to_string(),
					});
				}
			}
		}
		serde_json::from_value(Value::Object(fields)).map_err(|e| ReactiveError::InvalidFieldPatch {
			field: patch.keys().cloned().collect::<Vec<_>>().join(", "),
			reason: e.to_string(),
		})
	}
}

impl<T> Model for T where T: Clone + PartialEq + Serialize + DeserializeOwned + 'static {}

/// Structural equality of two models.
///
/// Compares field maps, so nested collections compare deeply and non-finite
/// floats (serialized as `null`) compare equal. Falls back to `PartialEq` for
/// values that are not maps.
pub fn model_eq<S: Model>(a: &S, b: &S) -> bool {
	match (a.fields(), b.fields()) {
		(Ok(left), Ok(right)) => left == right,
		_ => a == b,
	}
}

/// Builder for a partial model update.
///
/// Serialization errors are remembered and reported when the patch is
/// applied.
#[derive(Debug, Clone, Default)]
pub struct FieldPatch {
	fields: FieldMap,
	error: Option<ReactiveError>,
}

impl FieldPatch {
	/// Create an empty patch
	pub fn new() -> Self {
		Self::default()
	}

	/// Override `name` with `value`
	pub fn field(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
		let name = name.into();
		match serde_json::to_value(value) {
			Ok(value) => {
				self.fields.insert(name, value);
			}
			Err(e) => {
				self.error.get_or_insert(ReactiveError::InvalidFieldPatch {
					field: name,
					reason: e.to_string(),
				});
			}
		}
		self
	}

	/// Returns true if the patch overrides nothing
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty() && self.error.is_none()
	}

	/// The collected field map, or the first serialization error.
	pub fn into_fields(self) -> Result<FieldMap> {
		match self.error {
			Some(error) => Err(error),
			None => Ok(self.fields),
		}
	}
}

impl From<FieldMap> for FieldPatch {
	fn from(fields: FieldMap) -> Self {
		Self { fields, error: None }
	}
}

/// Apply `patch` to any cell holding a model.
///
/// The new value goes through the cell's own equality gate, so a patch whose
/// fields all equal the current ones is a no-op. On error the cell is left
/// untouched.
pub fn apply_patch<S: Model>(state: &State<S>, patch: FieldPatch) -> Result<bool> {
	let fields = patch.into_fields()?;
	state.try_set_with(|current| current.with_fields(&fields))
}

/// A [`State`] over a model, compared by field map.
///
/// Dereferences to the underlying `State<S>`, so `get`, `set`, `watch` and
/// `subscribe` are available directly.
pub struct ModelState<S: Model> {
	state: State<S>,
}

impl<S: Model> Clone for ModelState<S> {
	fn clone(&self) -> Self {
		Self {
			state: self.state.clone(),
		}
	}
}

impl<S: Model> ModelState<S> {
	/// Create an unnamed model cell
	pub fn new(model: S) -> Self {
		Self::with_name(model, None)
	}

	/// Create a model cell with an optional name
	pub fn with_name(model: S, name: Option<&str>) -> Self {
		Self {
			state: model_state(model, name),
		}
	}

	/// Override some fields.
	///
	/// Returns `Ok(true)` if the model changed.
	///
	/// # Errors
	///
	/// [`ReactiveError::InvalidFieldPatch`] for unknown fields or values of the
	/// wrong shape, [`ReactiveError::NotAModel`] if `S` is not a record.
	pub fn update(&self, patch: FieldPatch) -> Result<bool> {
		apply_patch(&self.state, patch)
	}

	/// Edit a copy of the model in place and commit it.
	pub fn modify(&self, edit: impl FnOnce(&mut S)) -> bool {
		self.state.set_with(|current| {
			let mut next = current.clone();
			edit(&mut next);
			next
		})
	}

	/// Replace the whole model
	pub fn replace(&self, model: S) -> bool {
		self.state.set(model)
	}

	/// Clone of the current model
	pub fn model(&self) -> S {
		self.state.get()
	}

	/// The underlying cell
	pub fn state(&self) -> &State<S> {
		&self.state
	}

	/// Unwrap into the underlying cell
	pub fn into_state(self) -> State<S> {
		self.state
	}
}

impl<S: Model> Deref for ModelState<S> {
	type Target = State<S>;

	fn deref(&self) -> &Self::Target {
		&self.state
	}
}

impl<S: Model + fmt::Debug> fmt::Debug for ModelState<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut out = f.debug_struct("ModelState");
		out.field("value", &*self.state.get_rc());
		if let Some(name) = self.state.name() {
			out.field("name", &name);
		}
		out.finish()
	}
}

/// Plain `State` over a model using field-map equality.
pub(crate) fn model_state<S: Model>(model: S, name: Option<&str>) -> State<S> {
	State::with_comparator(model, name, Rc::new(model_eq::<S>))
}

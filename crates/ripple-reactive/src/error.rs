//! Error types for the reactive layer.

use thiserror::Error;

/// Errors raised by cell operations that can reject their input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReactiveError {
	/// A field patch named a field the model does not have, or carried a
	/// value of the wrong shape.
	#[error("invalid patch for field `{field}`: {reason}")]
	InvalidFieldPatch {
		/// Offending field name
		field: String,
		/// What was wrong with it
		reason: String,
	},

	/// The value does not serialize to a record of named fields.
	#[error("`{type_name}` is not a model: it does not serialize to a map of fields")]
	NotAModel {
		/// Rust type name of the value
		type_name: &'static str,
	},
}

/// Result type for reactive operations.
pub type Result<T> = std::result::Result<T, ReactiveError>;

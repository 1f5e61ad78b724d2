//! Error types for component trees, contexts and stores.

use ripple_reactive::{ComponentId, ReactiveError};
use thiserror::Error;

/// Errors raised while mounting components or resolving providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
	/// A required context consumer found no provider above it
	#[error("context `{context}` not found: no provider is mounted above {consumer}")]
	ContextNotFound {
		/// Context name, or `unnamed`
		context: String,
		/// Type name of the consuming component
		consumer: &'static str,
	},

	/// A store consumer found no provider above it
	#[error("store `{store}` not found: no provider is mounted above {consumer}")]
	StoreNotFound {
		/// Store name, or `unnamed`
		store: String,
		/// Type name of the consuming component
		consumer: &'static str,
	},

	/// A reducer-context consumer found no provider above it
	#[error("reducer context `{context}` not found: no provider is mounted above {consumer}")]
	ReducerContextNotFound {
		/// Reducer context name, or `unnamed`
		context: String,
		/// Type name of the consuming component
		consumer: &'static str,
	},

	/// An effect was registered without any target
	#[error("effect on {component} must target at least one cell or store")]
	EffectRegistration {
		/// Type name of the component declaring the effect
		component: &'static str,
	},

	/// The id does not refer to a mounted component
	#[error("component {0} is not mounted")]
	UnknownComponent(ComponentId),

	/// A cell operation failed
	#[error(transparent)]
	Reactive(#[from] ReactiveError),
}

/// Result type for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Name used in diagnostics for contexts and stores without one
pub(crate) fn display_name(name: Option<&str>) -> String {
	name.unwrap_or("unnamed").to_string()
}

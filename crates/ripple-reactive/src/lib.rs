//! Reactive cells for component state.
//!
//! This crate provides the single-threaded core of ripple:
//!
//! - [`State`]: a value cell with equality-gated updates, synchronous
//!   watchers and asynchronous component subscribers
//! - [`ModelState`]: a cell over a structured [`Model`] with field patches
//! - [`ReducerBinding`]: a cell driven by a pure transition function
//! - [`Derived`]: a read-only cell computed from other cells
//! - [`Mailbox`]: the default FIFO [`DeliveryChannel`] for subscriber messages
//!
//! Component trees, contexts and stores are built on top of these in
//! `ripple-context`.
//!
//! ## Ordering
//!
//! For one accepted change, watchers run first (in registration order), then
//! one [`StateChanged`] message is posted to each subscriber (in subscription
//! order). Successive changes to one cell are processed in call order.

pub mod derived;
pub mod error;
pub mod logging;
pub mod model;
pub mod reducer;
pub mod runtime;
pub mod settings;
pub mod state;

pub use derived::{Derived, Source, Sources};
pub use error::{ReactiveError, Result};
pub use model::{FieldMap, FieldPatch, Model, ModelState, apply_patch, model_eq};
pub use reducer::ReducerBinding;
pub use runtime::{
	CellId, ComponentId, ComponentRef, DeliveryChannel, Envelope, Mailbox, StateChanged,
};
pub use settings::{Settings, SettingsError};
pub use state::{Comparator, State, WatchHandle, WatcherId, WeakState};

#[doc(hidden)]
pub mod __private {
	pub use tracing;
}

//! Component tree, effect tables, contexts and stores for Ripple.
//!
//! This crate builds the component-facing half of Ripple on top of the cells
//! in `ripple-reactive`:
//!
//! - [`ComponentTree`]: mounted components with parent links, a delivery
//!   channel for change messages and per-component teardown
//! - [`EffectTable`]: per-type handlers bound to cells by name or store
//! - [`Context`] and [`ReducerContext`]: values provided to a subtree and
//!   resolved from the nearest enclosing provider
//! - [`Store`]: a reducer declared once and mounted any number of times,
//!   each mount with its own state
//! - hooks such as [`use_state`] and [`use_derived`] that create cells owned
//!   by a component
//!
//! ## Example
//!
//! ```
//! use ripple_context::{Component, ComponentTree, ContextOptions, create_context, use_context};
//! use std::rc::Rc;
//!
//! struct Label;
//! impl Component for Label {}
//!
//! let theme = create_context("light".to_string(), Some("theme"));
//! let tree = ComponentTree::new();
//! let provider = tree.provide(None, &theme, "dark".to_string()).unwrap();
//! let label = tree.mount(provider, Rc::new(Label)).unwrap();
//!
//! let handle = use_context(&tree, label, &theme, ContextOptions::default()).unwrap();
//! assert_eq!(handle.get(), "dark");
//! assert!(!handle.is_default());
//! ```

pub mod component;
pub mod context;
pub mod effects;
pub mod error;
pub mod hooks;
pub mod reducer_context;
pub mod store;
pub mod tree;

pub use component::Component;
pub use context::{
	Context, ContextHandle, ContextOptions, create_context, create_model_context, use_context,
};
pub use effects::{EffectTable, EffectTarget, StoreId};
pub use error::{ContextError, Result};
pub use hooks::{use_derived, use_model_reducer, use_model_state, use_reducer, use_state};
pub use reducer_context::{ReducerContext, create_reducer_context, use_reducer_context};
pub use store::{Store, StoreHandle, create_store};
pub use tree::ComponentTree;

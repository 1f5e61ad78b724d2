//! Integration test utilities for Ripple
//!
//! Shared components and a log capture layer used by the cross-crate tests.

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use ripple::prelude::*;
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Counter model shared by the reducer and store tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
	pub count: i32,
}

/// Counter actions
#[derive(Debug, Clone, Copy)]
pub enum CounterAction {
	Increment,
	Reset,
}

/// Transition for [`Counter`]
pub fn reduce_counter(state: &Counter, action: &CounterAction) -> Counter {
	match action {
		CounterAction::Increment => Counter {
			count: state.count + 1,
		},
		CounterAction::Reset => Counter { count: 0 },
	}
}

/// A component that records every change message and every `count` effect.
#[derive(Default)]
pub struct Recorder {
	pub messages: RefCell<Vec<Option<String>>>,
	pub count_effects: RefCell<Vec<(i32, i32)>>,
}

impl Component for Recorder {
	fn effects() -> Result<EffectTable<Self>, ContextError> {
		EffectTable::new().register(["count"], |this: &Self, old: &i32, new: &i32| {
			this.count_effects.borrow_mut().push((*old, *new));
		})
	}

	fn on_state_changed(&self, event: &StateChanged) {
		self.messages
			.borrow_mut()
			.push(event.name().map(str::to_string));
	}
}

/// A component with no state of its own
pub struct Container;

impl Component for Container {}

/// A tracing layer that captures event messages as `[LEVEL] message`
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);

		if let Ok(mut logs) = self.logs.lock() {
			logs.push(format!("[{}] {}", event.metadata().level(), visitor.message));
		}
	}
}

/// Run `f` with a thread-local subscriber and return what it logged
pub fn capture_logs(f: impl FnOnce()) -> Vec<String> {
	let logs = Arc::new(Mutex::new(Vec::new()));
	let capture = LogCapture { logs: logs.clone() };
	{
		let _guard = tracing_subscriber::registry().with(capture).set_default();
		f();
	}
	logs.lock().map(|logs| logs.clone()).unwrap_or_default()
}

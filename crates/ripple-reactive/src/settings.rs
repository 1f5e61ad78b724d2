//! Runtime settings for the reactive layer.
//!
//! Settings can be built in code, deserialized, or read from `RIPPLE_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of drain rounds per delivery pass
const DEFAULT_MAX_DELIVERY_ROUNDS: usize = 64;

/// Prefix shared by every environment variable read by [`Settings::from_env`]
pub const ENV_PREFIX: &str = "RIPPLE_";

/// Errors raised while reading settings from the environment
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
	/// A variable was set to a value that could not be parsed
	#[error("invalid value {value:?} for {key}: {reason}")]
	InvalidValue {
		/// Full variable name
		key: String,
		/// Raw value
		value: String,
		/// Parser message
		reason: String,
	},
}

/// Settings consulted by the component tree and context resolution.
///
/// # Examples
///
/// ```
/// use ripple_reactive::Settings;
///
/// let settings = Settings::default()
/// 	.with_max_delivery_rounds(8)
/// 	.with_warn_on_default_context(false);
/// assert_eq!(settings.max_delivery_rounds(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	max_delivery_rounds: usize,
	warn_on_default_context: bool,
	trace_deliveries: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			max_delivery_rounds: DEFAULT_MAX_DELIVERY_ROUNDS,
			warn_on_default_context: true,
			trace_deliveries: false,
		}
	}
}

impl Settings {
	/// Read settings from `RIPPLE_*` environment variables.
	///
	/// Unset variables keep their defaults.
	///
	/// | Variable | Type |
	/// |----------|------|
	/// | `RIPPLE_MAX_DELIVERY_ROUNDS` | integer |
	/// | `RIPPLE_WARN_DEFAULT_CONTEXT` | boolean |
	/// | `RIPPLE_TRACE_DELIVERIES` | boolean |
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Like [`from_env`](Self::from_env) but reading from `lookup`.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
		let read = |suffix: &str| {
			let key = format!("{}{}", ENV_PREFIX, suffix);
			lookup(&key).map(|value| (key, value))
		};

		let mut settings = Self::default();
		if let Some((key, value)) = read("MAX_DELIVERY_ROUNDS") {
			settings.max_delivery_rounds = value.trim().parse::<usize>().map_err(|e| {
				SettingsError::InvalidValue {
					key,
					value: value.clone(),
					reason: e.to_string(),
				}
			})?;
		}
		if let Some((key, value)) = read("WARN_DEFAULT_CONTEXT") {
			settings.warn_on_default_context = parse_bool(&key, &value)?;
		}
		if let Some((key, value)) = read("TRACE_DELIVERIES") {
			settings.trace_deliveries = parse_bool(&key, &value)?;
		}
		Ok(settings)
	}

	/// Set the maximum number of drain rounds per delivery pass.
	///
	/// Values below 1 are raised to 1.
	pub fn with_max_delivery_rounds(mut self, rounds: usize) -> Self {
		self.max_delivery_rounds = rounds.max(1);
		self
	}

	/// Enable or disable the warning for default-sourced contexts
	pub fn with_warn_on_default_context(mut self, enabled: bool) -> Self {
		self.warn_on_default_context = enabled;
		self
	}

	/// Enable or disable per-message delivery tracing
	pub fn with_trace_deliveries(mut self, enabled: bool) -> Self {
		self.trace_deliveries = enabled;
		self
	}

	/// Maximum number of drain rounds per delivery pass
	pub fn max_delivery_rounds(&self) -> usize {
		self.max_delivery_rounds.max(1)
	}

	/// Whether falling back to a context default emits a warning
	pub fn warn_on_default_context(&self) -> bool {
		self.warn_on_default_context
	}

	/// Whether every delivered message is traced
	pub fn trace_deliveries(&self) -> bool {
		self.trace_deliveries
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(SettingsError::InvalidValue {
			key: key.to_string(),
			value: value.to_string(),
			reason: "expected a boolean".to_string(),
		}),
	}
}

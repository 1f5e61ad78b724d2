//! Development-time logging macros.
//!
//! Thin wrappers over `tracing` that compile to nothing in release builds.
//!
//! | Macro | Debug Assertions | Feature Required | Level |
//! |-------|------------------|------------------|-------|
//! | `debug_log!` | Required | `debug-hooks` | `DEBUG` |
//! | `warn_log!` | Required | None | `WARN` |
//!
//! Events always carry the `ripple` target so a subscriber can filter them
//! as a group.
//!
//! ```
//! use ripple_reactive::{debug_log, warn_log};
//!
//! debug_log!("binding effect for {}", "count");
//! warn_log!("context `{}` has no provider", "theme");
//! ```

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks"))]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::debug!(target: "ripple", $($arg)*);
	}};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
	($($arg:tt)*) => {{}};
}

/// Logs a warning (requires `debug_assertions`)
#[macro_export]
#[cfg(debug_assertions)]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::warn!(target: "ripple", $($arg)*);
	}};
}

/// No-op warn_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! warn_log {
	($($arg:tt)*) => {{}};
}

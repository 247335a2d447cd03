//! Process-wide tracing/logging setup.

pub mod tracing;

pub use crate::tracing::{DEFAULT_DIRECTIVES, LogFormat};

/// Initialize process-wide logging with JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}

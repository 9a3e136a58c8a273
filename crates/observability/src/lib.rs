//! Tracing/logging setup shared by hosts of the moderation core.

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init_with(logging::LogFormat::from_env());
}

/// Subscriber construction (filters, output format).
pub mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat};

//! Tracing and logging setup shared by every binary embedding the inventory services.

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::{LogFormat, ObservabilityConfig};

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&ObservabilityConfig::from_env());
}

/// Initialize process-wide tracing with an explicit configuration.
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init(config);
}

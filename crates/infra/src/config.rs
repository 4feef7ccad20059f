//! Configuration loading and representation.
//!
//! Values come from environment variables with defaults; malformed values are
//! logged and replaced by the default rather than failing startup.

use std::time::Duration;

/// Environment variable holding the row-lock wait in milliseconds.
pub const LOCK_TIMEOUT_ENV: &str = "STOCKFLOW_LOCK_TIMEOUT_MS";

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// How long a movement waits for a product's stock lock before failing
    /// with `LockTimeout`.
    pub lock_timeout: Duration,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl InventoryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests, layered config sources).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(LOCK_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.lock_timeout = Duration::from_millis(ms),
                _ => tracing::warn!(
                    value = %raw,
                    default_ms = DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
                    "{LOCK_TIMEOUT_ENV} is not a positive integer; using default"
                ),
            }
        }

        config
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

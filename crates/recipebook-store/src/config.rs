//! Store configuration loaded from environment variables.
//!
//! All settings have defaults so a store can be built with zero
//! configuration.

use std::time::Duration;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound for any single remote call (subscribe/put/patch/delete).
    /// Expiry is reported as a network error and never retried.
    /// Env: `RECIPEBOOK_REMOTE_TIMEOUT_MS`
    /// Default: `10000`
    pub remote_timeout: Duration,

    /// Buffered store events per listener before slow listeners lag.
    /// Env: `RECIPEBOOK_EVENT_CAPACITY`
    /// Default: `256`
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
            event_capacity: 256,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("RECIPEBOOK_REMOTE_TIMEOUT_MS") {
            match parse_positive(&val) {
                Some(ms) => config.remote_timeout = Duration::from_millis(ms as u64),
                None => tracing::warn!(
                    value = %val,
                    "Invalid RECIPEBOOK_REMOTE_TIMEOUT_MS, using default"
                ),
            }
        }

        if let Some(val) = lookup("RECIPEBOOK_EVENT_CAPACITY") {
            match parse_positive(&val) {
                Some(n) => config.event_capacity = n,
                None => tracing::warn!(
                    value = %val,
                    "Invalid RECIPEBOOK_EVENT_CAPACITY, using default"
                ),
            }
        }

        config
    }
}

/// Parse a strictly positive count.
pub fn parse_positive(val: &str) -> Option<usize> {
    val.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

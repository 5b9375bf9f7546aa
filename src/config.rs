//! Runtime configuration for signature collection.

use std::env;
use std::time::Duration;

/// Environment variable holding the per-witness signing timeout.
pub const SIGN_TIMEOUT_ENV: &str = "WB_SIGN_TIMEOUT_MS";

/// Default per-witness signing timeout.
pub const DEFAULT_SIGN_TIMEOUT_MS: u64 = 10_000;

/// Knobs for [`SignatureCollector`](crate::SignatureCollector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Upper bound on each individual signing call; `None` waits forever.
    pub sign_timeout: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sign_timeout: Some(Duration::from_millis(DEFAULT_SIGN_TIMEOUT_MS)),
        }
    }
}

impl CollectorConfig {
    /// Configuration without a signing timeout.
    pub fn unbounded() -> Self {
        Self { sign_timeout: None }
    }

    /// Configuration with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            sign_timeout: Some(timeout),
        }
    }

    /// Reads `WB_SIGN_TIMEOUT_MS`; `0` disables the timeout and unparsable
    /// values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_timeout_value(env::var(SIGN_TIMEOUT_ENV).ok().as_deref())
    }

    fn from_timeout_value(raw: Option<&str>) -> Self {
        match raw.and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(0) => Self::unbounded(),
            Some(ms) => Self::with_timeout(Duration::from_millis(ms)),
            None => Self::default(),
        }
    }
}

//! Loader configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// When a scope turns its pending requests into batch fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum FlushPolicy {
    /// Only [`LoadScope::flush()`](crate::scope::LoadScope::flush) dispatches requests.
    Manual,
    /// The first request of a window schedules a flush on the tokio runtime.
    /// The flush runs once the enqueuing task yields and `delay_ms` has passed;
    /// `0` means a single scheduler yield.
    #[serde(rename_all = "camelCase")]
    Auto { delay_ms: u64 },
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self::Auto { delay_ms: 0 }
    }
}

/// Configuration shared by every scope a [`LoaderFactory`](crate::scope::LoaderFactory)
/// creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderConfig {
    /// How flushes are triggered. Default: auto with no delay.
    pub flush_policy: FlushPolicy,
    /// Deadline for a single group fetch. Default: none.
    pub fetch_timeout_ms: Option<u64>,
    /// Maximum keys per store round-trip. Larger groups are split into
    /// chunks. Default: unbounded, one round-trip per filter.
    pub max_batch_keys: Option<usize>,
}

impl LoaderConfig {
    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this type.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Manual flushing, otherwise defaults.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            flush_policy: FlushPolicy::Manual,
            ..Self::default()
        }
    }

    /// The fetch timeout as a [`Duration`], if configured.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

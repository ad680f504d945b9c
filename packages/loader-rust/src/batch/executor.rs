//! Executes one batch group against the persistence store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use coalesce_core::{ChildRecord, ChildStore};
use futures_util::future::join_all;
use tracing::{debug, warn};

use super::grouping::BatchGroup;
use crate::config::LoaderConfig;
use crate::error::LoadError;

/// Turns a [`BatchGroup`] into a single store round-trip.
///
/// Shared by every scope created from the same
/// [`LoaderFactory`](crate::scope::LoaderFactory); holds no per-scope state.
pub struct BatchExecutor {
    store: Arc<dyn ChildStore>,
    fetch_timeout: Option<Duration>,
    max_batch_keys: Option<usize>,
    round_trips: AtomicU64,
}

impl BatchExecutor {
    /// Creates an executor over `store`, applying the timeout and chunking
    /// settings from `config`.
    #[must_use]
    pub fn new(store: Arc<dyn ChildStore>, config: &LoaderConfig) -> Self {
        Self {
            store,
            fetch_timeout: config.fetch_timeout(),
            max_batch_keys: config.max_batch_keys,
            round_trips: AtomicU64::new(0),
        }
    }

    /// Fetches every child of the group's keys that satisfies its filter.
    ///
    /// One store round-trip unless `max_batch_keys` forces chunking, in which
    /// case the chunks run concurrently and any failing chunk fails the group.
    /// Every chunk runs to completion before the group's outcome is decided.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Backend`] if the store fails and
    /// [`LoadError::Timeout`] if it exceeds the configured deadline.
    pub async fn execute(&self, group: &BatchGroup) -> Result<Vec<ChildRecord>, LoadError> {
        if group.keys.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = group.chunks(self.max_batch_keys.unwrap_or(0));
        if chunks.len() == 1 {
            return self.fetch(group).await;
        }

        let fetched = join_all(chunks.iter().map(|chunk| self.fetch(chunk))).await;
        let mut records = Vec::new();
        for chunk in fetched {
            records.extend(chunk?);
        }
        Ok(records)
    }

    /// Total store round-trips issued by this executor.
    #[must_use]
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    async fn fetch(&self, group: &BatchGroup) -> Result<Vec<ChildRecord>, LoadError> {
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        let fut = self
            .store
            .fetch_children(&group.keys, group.filter.as_ref());

        let result = match self.fetch_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    #[allow(clippy::cast_possible_truncation)]
                    let timeout_ms = deadline.as_millis() as u64;
                    warn!(filter = ?group.filter, keys = group.keys.len(), timeout_ms, "child fetch timed out");
                    return Err(LoadError::Timeout { timeout_ms });
                }
            },
            None => fut.await,
        };

        match result {
            Ok(records) => {
                debug!(
                    filter = ?group.filter,
                    keys = group.keys.len(),
                    records = records.len(),
                    "child fetch complete"
                );
                Ok(records)
            }
            Err(err) => {
                warn!(filter = ?group.filter, keys = group.keys.len(), error = %err, "child fetch failed");
                Err(LoadError::from(err))
            }
        }
    }
}

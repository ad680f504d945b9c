//! Failure conditions delivered to callers waiting on a load.

use std::sync::Arc;

/// Errors a pending load can resolve with.
///
/// `Clone` because one failure is fanned out to every caller waiting on the
/// failed batch group.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The persistence store fetch for this request's group failed.
    #[error("backend fetch failed: {0}")]
    Backend(Arc<anyhow::Error>),
    /// The store did not answer within the configured fetch timeout.
    #[error("backend fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The enclosing scope was cancelled before the request resolved.
    #[error("load scope cancelled before the request resolved")]
    Cancelled,
}

impl LoadError {
    /// Whether the failure originated at the persistence store.
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Timeout { .. })
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        Self::Backend(Arc::new(err))
    }
}

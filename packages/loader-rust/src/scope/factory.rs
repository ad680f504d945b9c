//! Factory for per-operation [`LoadScope`]s.
//!
//! [`LoaderFactory`] is the dependency injection point: it holds the shared
//! [`BatchExecutor`] (and through it the store) plus the loader
//! configuration, and hands out a fresh scope for every logical operation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use coalesce_core::ChildStore;

use super::LoadScope;
use crate::batch::BatchExecutor;
use crate::config::LoaderConfig;

/// Creates [`LoadScope`]s that share one executor and configuration.
///
/// Scopes created by the same factory share nothing but the store: each has
/// its own memoization map and flush windows.
pub struct LoaderFactory {
    config: LoaderConfig,
    executor: Arc<BatchExecutor>,
    next_scope_id: AtomicU64,
}

impl LoaderFactory {
    /// Creates a factory over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ChildStore>, config: LoaderConfig) -> Self {
        let executor = Arc::new(BatchExecutor::new(store, &config));
        Self {
            config,
            executor,
            next_scope_id: AtomicU64::new(1),
        }
    }

    /// Opens a scope for one logical operation.
    ///
    /// The scope should be dropped when the operation ends.
    #[must_use]
    pub fn scope(&self) -> LoadScope {
        let id = self.next_scope_id.fetch_add(1, Ordering::Relaxed);
        LoadScope::new(id, Arc::clone(&self.executor), &self.config)
    }

    /// The executor shared by all scopes.
    #[must_use]
    pub fn executor(&self) -> Arc<BatchExecutor> {
        Arc::clone(&self.executor)
    }

    /// The configuration scopes are created with.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

use async_trait::async_trait;

use crate::types::{ChildFilter, ChildRecord, ParentRecord, PrimaryKey};

/// Read side of the persistence store used by the batch loader.
/// Implementations: in-memory (tests, demos), `PostgreSQL`, null.
#[async_trait]
pub trait ChildStore: Send + Sync {
    /// Fetch every child whose parent key is in `parent_keys`, restricted by
    /// `filter` when one is given.
    ///
    /// Must be a single round-trip regardless of how many keys are passed.
    /// Records come back in store order; callers do not re-sort them.
    async fn fetch_children(
        &self,
        parent_keys: &[PrimaryKey],
        filter: Option<&ChildFilter>,
    ) -> anyhow::Result<Vec<ChildRecord>>;
}

/// Source of the top-level parent rows that trigger child loads.
#[async_trait]
pub trait ParentStore: Send + Sync {
    /// Fetch all parents in store order.
    async fn fetch_parents(&self) -> anyhow::Result<Vec<ParentRecord>>;
}

//! No-op store implementation.
//!
//! [`NullStore`] holds no rows: every parent has zero children and there are
//! no parents. Useful for wiring tests and for exercising the empty-result path.

use async_trait::async_trait;
use coalesce_core::{ChildFilter, ChildRecord, ChildStore, ParentRecord, ParentStore, PrimaryKey};

/// Store that answers every fetch with nothing.
pub struct NullStore;

#[async_trait]
impl ChildStore for NullStore {
    async fn fetch_children(
        &self,
        _parent_keys: &[PrimaryKey],
        _filter: Option<&ChildFilter>,
    ) -> anyhow::Result<Vec<ChildRecord>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ParentStore for NullStore {
    async fn fetch_parents(&self) -> anyhow::Result<Vec<ParentRecord>> {
        Ok(Vec::new())
    }
}

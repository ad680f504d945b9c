//! Parent → children resolution on top of a [`LoadScope`].
//!
//! Resolving N parents lazily would normally cost one child query per parent.
//! Here every parent's `children` field registers a load in the shared scope,
//! and a single flush answers all of them with one fetch per distinct filter.

use coalesce_core::{ChildFilter, ChildRecord, ParentRecord, ParentStore, PrimaryKey};
use futures_util::future::join_all;
use serde::Serialize;

use crate::error::LoadError;
use crate::scope::{LoadScope, PendingLoad};

/// A parent whose children are resolved lazily through a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentNode {
    pub id: PrimaryKey,
    pub name: String,
}

impl ParentNode {
    /// Registers a load for this parent's children under `filter`.
    pub fn children(&self, scope: &LoadScope, filter: Option<ChildFilter>) -> PendingLoad {
        scope.load(filter, self.id)
    }
}

impl From<ParentRecord> for ParentNode {
    fn from(record: ParentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

/// A parent with its children filled in, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedParent {
    pub id: PrimaryKey,
    pub name: String,
    pub children: Vec<ChildRecord>,
}

/// Loads every parent and its children (restricted by `filter`).
///
/// Issues one parent query, then one child fetch per distinct filter no matter
/// how many parents there are.
///
/// # Errors
///
/// Returns [`LoadError::Backend`] if the parent query or the child fetch
/// fails, and [`LoadError::Cancelled`] if the scope is cancelled meanwhile.
pub async fn resolve_parents(
    parents: &dyn ParentStore,
    scope: &LoadScope,
    filter: Option<ChildFilter>,
) -> Result<Vec<ResolvedParent>, LoadError> {
    let nodes: Vec<ParentNode> = parents
        .fetch_parents()
        .await?
        .into_iter()
        .map(ParentNode::from)
        .collect();

    let pending: Vec<PendingLoad> = nodes
        .iter()
        .map(|node| node.children(scope, filter.clone()))
        .collect();
    scope.flush().await;

    nodes
        .into_iter()
        .zip(join_all(pending).await)
        .map(|(node, children)| {
            Ok(ResolvedParent {
                id: node.id,
                name: node.name,
                children: children?,
            })
        })
        .collect()
}

//! Maps fetched records back onto the keys and requests that asked for them.

use std::collections::HashMap;

use coalesce_core::{ChildFilter, ChildRecord, LoadRequest, PrimaryKey};

use crate::error::LoadError;

/// Children of each requested key within one group, in store order.
pub type KeyedChildren = HashMap<PrimaryKey, Vec<ChildRecord>>;

/// Outcome of every group in a batch, keyed by filter.
pub type GroupOutcomes = HashMap<Option<ChildFilter>, Result<KeyedChildren, LoadError>>;

/// Buckets `records` under the requested `keys`.
///
/// Every key gets an entry, empty if nothing matched. Records whose parent
/// was not requested are dropped.
#[must_use]
pub fn associate(keys: &[PrimaryKey], records: Vec<ChildRecord>) -> KeyedChildren {
    let mut by_key: KeyedChildren = keys.iter().map(|&key| (key, Vec::new())).collect();
    for record in records {
        if let Some(children) = by_key.get_mut(&record.parent_key) {
            children.push(record);
        }
    }
    by_key
}

/// Builds one result per request, aligned with `requests`.
///
/// Requests may repeat keys, mix filters and arrive in any order; each entry
/// is looked up in the outcome of its own filter's group. A group failure is
/// reported to every request in that group only.
#[must_use]
pub fn align(
    requests: &[LoadRequest],
    outcomes: &GroupOutcomes,
) -> Vec<Result<Vec<ChildRecord>, LoadError>> {
    requests
        .iter()
        .map(|request| match outcomes.get(&request.filter) {
            Some(Ok(by_key)) => Ok(by_key.get(&request.key).cloned().unwrap_or_default()),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Vec::new()),
        })
        .collect()
}

//! Stateless batch pipeline: grouping, execution, and result association.
//!
//! A batch of requests flows through three stages:
//!
//! 1. **Grouping** ([`group_requests`]): one [`BatchGroup`] per distinct filter
//! 2. **Execution** ([`BatchExecutor`]): one store round-trip per group
//! 3. **Association** ([`associate`], [`align`]): records back onto keys, then
//!    onto the original request order
//!
//! [`LoadScope`](crate::scope::LoadScope) drives the same stages per flush
//! window; [`load_batch`] runs them once for callers that already hold the
//! full request list.

pub mod associate;
pub mod executor;
pub mod grouping;

pub use associate::{align, associate, GroupOutcomes, KeyedChildren};
pub use executor::BatchExecutor;
pub use grouping::{group_requests, BatchGroup};

use coalesce_core::{ChildRecord, LoadRequest};
use futures_util::future::join_all;

use crate::error::LoadError;

/// Resolves `requests` with one fetch per distinct filter.
///
/// The output has one entry per request, in request order. Groups execute
/// concurrently and fail independently.
pub async fn load_batch(
    executor: &BatchExecutor,
    requests: &[LoadRequest],
) -> Vec<Result<Vec<ChildRecord>, LoadError>> {
    let groups = group_requests(requests);
    let outcomes: GroupOutcomes = join_all(groups.into_iter().map(|group| async move {
        let outcome = executor
            .execute(&group)
            .await
            .map(|records| associate(&group.keys, records));
        (group.filter, outcome)
    }))
    .await
    .into_iter()
    .collect();

    align(requests, &outcomes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use coalesce_core::ChildFilter;

    use super::*;
    use crate::config::LoaderConfig;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn ten_requests_two_filters_two_fetches() {
        let store = Arc::new(MemoryStore::seeded_library(10, 1));
        let executor = BatchExecutor::new(store.clone(), &LoaderConfig::default());
        let book = Some(ChildFilter::title_contains("Book"));

        let requests: Vec<LoadRequest> = (1..=10)
            .map(|key| LoadRequest::new(if key <= 6 { None } else { book.clone() }, key))
            .collect();
        let results = load_batch(&executor, &requests).await;

        assert_eq!(store.fetch_count(), 2);
        assert_eq!(results.len(), 10);
        for (key, result) in (1..=10).zip(&results) {
            let children = result.as_ref().unwrap();
            assert_eq!(children.len(), 1);
            assert_eq!(children[0].parent_key, key);
        }
    }

    #[tokio::test]
    async fn repeated_requests_share_results() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let executor = BatchExecutor::new(store.clone(), &LoaderConfig::default());
        let requests = vec![
            LoadRequest::unfiltered(1),
            LoadRequest::new(Some(ChildFilter::title_contains("Book")), 2),
            LoadRequest::unfiltered(1),
        ];

        let results = load_batch(&executor, &requests).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), results[2].as_ref().unwrap());
        assert_eq!(results[1].as_ref().unwrap().len(), 5);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_group_leaves_siblings_intact() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let bad = Some(ChildFilter::title_contains("Book"));
        store.fail_on(bad.clone());
        let executor = BatchExecutor::new(store, &LoaderConfig::default());

        let requests = vec![LoadRequest::new(bad, 1), LoadRequest::unfiltered(2)];
        let results = load_batch(&executor, &requests).await;
        assert!(results[0].as_ref().unwrap_err().is_backend());
        assert_eq!(results[1].as_ref().unwrap().len(), 5);
    }
}

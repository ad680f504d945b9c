//! In-memory [`ChildStore`] and [`ParentStore`] implementation.
//!
//! Keeps rows in insertion order, which is the "store order" results come
//! back in. Counts and logs every fetch so tests can assert how many
//! round-trips a batch took, and can be told to fail fetches for a filter.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use coalesce_core::{ChildFilter, ChildRecord, ChildStore, ParentRecord, ParentStore, PrimaryKey};
use parking_lot::{Mutex, RwLock};

/// A fetch as observed by [`MemoryStore`]: the filter and keys it was called with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub filter: Option<ChildFilter>,
    pub keys: Vec<PrimaryKey>,
}

/// In-memory parent/child tables.
#[derive(Default)]
pub struct MemoryStore {
    parents: RwLock<Vec<ParentRecord>>,
    children: RwLock<Vec<ChildRecord>>,
    fetches: AtomicU64,
    fetch_log: Mutex<Vec<FetchCall>>,
    failing: RwLock<HashSet<Option<ChildFilter>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `parents` authors, each owning
    /// `children_per_parent` consecutive books.
    ///
    /// Parent `i` is named `"Author i"`; child `n` is titled `"Book n"`.
    /// Ids start at 1, so parent 1 owns books `1..=children_per_parent`.
    #[must_use]
    pub fn seeded_library(parents: usize, children_per_parent: usize) -> Self {
        let store = Self::new();
        let mut next_child: PrimaryKey = 1;
        for parent_id in (1..).take(parents) {
            store.insert_parent(ParentRecord {
                id: parent_id,
                name: format!("Author {parent_id}"),
            });
            for _ in 0..children_per_parent {
                store.insert_child(ChildRecord {
                    id: next_child,
                    parent_key: parent_id,
                    title: format!("Book {next_child}"),
                });
                next_child += 1;
            }
        }
        store
    }

    /// Appends a parent row.
    pub fn insert_parent(&self, parent: ParentRecord) {
        self.parents.write().push(parent);
    }

    /// Appends a child row.
    pub fn insert_child(&self, child: ChildRecord) {
        self.children.write().push(child);
    }

    /// Makes every subsequent fetch under `filter` fail.
    pub fn fail_on(&self, filter: Option<ChildFilter>) {
        self.failing.write().insert(filter);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Number of `fetch_children` calls served (including failed ones).
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every `fetch_children` call in arrival order.
    #[must_use]
    pub fn fetch_log(&self) -> Vec<FetchCall> {
        self.fetch_log.lock().clone()
    }
}

#[async_trait]
impl ChildStore for MemoryStore {
    async fn fetch_children(
        &self,
        parent_keys: &[PrimaryKey],
        filter: Option<&ChildFilter>,
    ) -> anyhow::Result<Vec<ChildRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_log.lock().push(FetchCall {
            filter: filter.cloned(),
            keys: parent_keys.to_vec(),
        });

        if self.failing.read().contains(&filter.cloned()) {
            anyhow::bail!("memory store unavailable for filter {filter:?}");
        }

        let wanted: HashSet<PrimaryKey> = parent_keys.iter().copied().collect();
        Ok(self
            .children
            .read()
            .iter()
            .filter(|child| wanted.contains(&child.parent_key))
            .filter(|child| filter.is_none_or(|f| f.matches(child)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ParentStore for MemoryStore {
    async fn fetch_parents(&self) -> anyhow::Result<Vec<ParentRecord>> {
        Ok(self.parents.read().clone())
    }
}

//! Per-operation request coalescing.
//!
//! A [`LoadScope`] lives for one logical operation (e.g. resolving one
//! top-level query). It owns the memoization map for that operation and
//! decides when buffered requests are turned into batch fetches.
//!
//! Slot lifecycle: Pending (queued in the open window) → in flight (its
//! group is being fetched) → resolved or failed. A slot is created once per
//! `(filter, key)` and reused for every later identical request in the scope,
//! across all flush windows.
//!
//! Scope lifecycle: Open → Flush → Resolving, repeated as often as new
//! requests arrive, until the scope is cancelled or dropped.
//!
//! Under [`FlushPolicy::Auto`] the window closes when a caller first polls an
//! unresolved handle: at that point the polling task has registered every
//! load it issues before suspending. The flush itself runs on a spawned task,
//! after the configured delay, and only if that window is still open.

mod factory;
mod slot;

pub use factory::LoaderFactory;
pub use slot::{LoadResult, PendingLoad};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use coalesce_core::{ChildFilter, ChildRecord, LoadRequest, PrimaryKey};
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info_span, warn, Instrument};

use crate::batch::{associate, group_requests, BatchExecutor, BatchGroup};
use crate::config::{FlushPolicy, LoaderConfig};
use crate::error::LoadError;
use slot::{pending_slot, resolved_slot, FlushTrigger, SharedResult};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of one flush window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// 1-based window number within the scope; 0 if nothing was flushed.
    pub window: u64,
    /// Requests taken from the open window.
    pub requests: usize,
    /// Batch groups dispatched (one per distinct filter).
    pub groups: usize,
    /// Groups whose fetch failed.
    pub failed_groups: usize,
}

/// Point-in-time counters for a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeStats {
    /// Distinct `(filter, key)` slots created, including primed ones.
    pub slots: usize,
    /// Requests waiting for the next flush.
    pub queued: usize,
    /// Requests whose group fetch is in progress.
    pub in_flight: usize,
    /// Non-empty flush windows completed or started.
    pub windows: u64,
    /// Batch groups dispatched over the scope's lifetime.
    pub groups_dispatched: u64,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Queued {
    request: LoadRequest,
    tx: oneshot::Sender<LoadResult>,
}

#[derive(Default)]
struct ScopeState {
    slots: HashMap<LoadRequest, SharedResult>,
    queue: Vec<Queued>,
    in_flight: HashMap<LoadRequest, oneshot::Sender<LoadResult>>,
    /// Bumped whenever the open window is taken, so stale timers do nothing.
    generation: u64,
    flush_scheduled: bool,
    cancelled: bool,
    windows: u64,
    groups_dispatched: u64,
}

struct ScopeInner {
    id: u64,
    executor: Arc<BatchExecutor>,
    flush_policy: FlushPolicy,
    state: Mutex<ScopeState>,
}

impl ScopeInner {
    fn load(self: &Arc<Self>, request: LoadRequest) -> PendingLoad {
        let mut state = self.state.lock();
        let shared = if let Some(existing) = state.slots.get(&request) {
            existing.clone()
        } else if state.cancelled {
            return PendingLoad::new(resolved_slot(Err(LoadError::Cancelled)));
        } else {
            let (tx, shared) = pending_slot();
            state.slots.insert(request.clone(), shared.clone());
            state.queue.push(Queued { request, tx });
            shared
        };

        match self.flush_policy {
            FlushPolicy::Auto { .. } if !state.cancelled => PendingLoad::with_trigger(
                shared,
                FlushTrigger {
                    scope: Arc::downgrade(self),
                    generation: state.generation,
                },
            ),
            _ => PendingLoad::new(shared),
        }
    }

    /// Arms the automatic flush for window `generation`.
    ///
    /// Called from the first poll of a handle, so the registering task has
    /// already queued everything it issues before suspending. Does nothing if
    /// that window was flushed meanwhile or a flush is already armed.
    fn request_flush(self: &Arc<Self>, generation: u64) {
        let FlushPolicy::Auto { delay_ms } = self.flush_policy else {
            return;
        };
        {
            let mut state = self.state.lock();
            if state.cancelled
                || state.flush_scheduled
                || state.generation != generation
                || state.queue.is_empty()
            {
                return;
            }
            state.flush_scheduled = true;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(
                scope_id = self.id,
                "no tokio runtime; pending loads wait for an explicit flush"
            );
            self.state.lock().flush_scheduled = false;
            return;
        };

        let inner = Arc::clone(self);
        handle.spawn(async move {
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            inner.dispatch(Some(generation)).await;
        });
    }

    async fn flush(self: &Arc<Self>) -> FlushReport {
        self.dispatch(None).await
    }

    /// Takes the open window and fetches it. With `expected` set, only the
    /// window of that generation is taken.
    async fn dispatch(self: &Arc<Self>, expected: Option<u64>) -> FlushReport {
        let (requests, window) = {
            let mut state = self.state.lock();
            if expected.is_some_and(|generation| generation != state.generation) {
                return FlushReport::default();
            }
            state.flush_scheduled = false;
            if state.cancelled || state.queue.is_empty() {
                return FlushReport::default();
            }
            state.generation += 1;
            state.windows += 1;
            let window = state.windows;
            let queued = std::mem::take(&mut state.queue);
            let mut requests = Vec::with_capacity(queued.len());
            for Queued { request, tx } in queued {
                requests.push(request.clone());
                state.in_flight.insert(request, tx);
            }
            (requests, window)
        };

        let groups = group_requests(&requests);
        self.state.lock().groups_dispatched += groups.len() as u64;

        let span = info_span!(
            "flush",
            scope_id = self.id,
            window,
            requests = requests.len(),
            groups = groups.len(),
            duration_ms = tracing::field::Empty,
            failed_groups = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let outcomes = join_all(groups.iter().map(|group| self.run_group(group))).await;
            let failed_groups = outcomes.iter().filter(|ok| !**ok).count();

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("failed_groups", failed_groups);
            debug!(duration_ms, failed_groups, "flush complete");

            FlushReport {
                window,
                requests: requests.len(),
                groups: groups.len(),
                failed_groups,
            }
        }
        .instrument(span)
        .await
    }

    /// Fetches one group and resolves its slots as soon as the fetch returns,
    /// without waiting for sibling groups. Returns whether the fetch succeeded.
    async fn run_group(&self, group: &BatchGroup) -> bool {
        let outcome = self
            .executor
            .execute(group)
            .await
            .map(|records| associate(&group.keys, records));

        // Slots of a cancelled scope were already rejected; their senders are gone.
        let waiting: Vec<(PrimaryKey, oneshot::Sender<LoadResult>)> = {
            let mut state = self.state.lock();
            group
                .keys
                .iter()
                .filter_map(|&key| {
                    state
                        .in_flight
                        .remove(&LoadRequest::new(group.filter.clone(), key))
                        .map(|tx| (key, tx))
                })
                .collect()
        };

        match outcome {
            Ok(mut by_key) => {
                for (key, tx) in waiting {
                    let _ = tx.send(Ok(by_key.remove(&key).unwrap_or_default()));
                }
                true
            }
            Err(err) => {
                for (_, tx) in waiting {
                    let _ = tx.send(Err(err.clone()));
                }
                false
            }
        }
    }

    fn cancel(&self) {
        let (queued, in_flight) = {
            let mut state = self.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            (
                std::mem::take(&mut state.queue),
                std::mem::take(&mut state.in_flight),
            )
        };

        if !queued.is_empty() || !in_flight.is_empty() {
            debug!(
                scope_id = self.id,
                queued = queued.len(),
                in_flight = in_flight.len(),
                "scope cancelled with unresolved loads"
            );
        }
        for Queued { tx, .. } in queued {
            let _ = tx.send(Err(LoadError::Cancelled));
        }
        for (_, tx) in in_flight {
            let _ = tx.send(Err(LoadError::Cancelled));
        }
    }
}

// ---------------------------------------------------------------------------
// LoadScope
// ---------------------------------------------------------------------------

/// Coalesces child loads issued during one logical operation.
///
/// Deduplication is scope-wide and filter-sensitive: equal `(filter, key)`
/// requests share one slot for the scope's whole lifetime. Each flush issues
/// one fetch per distinct filter among the queued requests.
///
/// Not `Clone`: the scope's lifetime is the operation's lifetime. Dropping it
/// cancels every unresolved load; fetches already running are allowed to
/// finish and their results are discarded.
pub struct LoadScope {
    inner: Arc<ScopeInner>,
}

impl LoadScope {
    /// Creates a scope over `executor`.
    ///
    /// Usually obtained from [`LoaderFactory::scope()`] instead.
    #[must_use]
    pub fn new(id: u64, executor: Arc<BatchExecutor>, config: &LoaderConfig) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id,
                executor,
                flush_policy: config.flush_policy,
                state: Mutex::new(ScopeState::default()),
            }),
        }
    }

    /// Identifier used in tracing output.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Requests the children of `key` under `filter`.
    ///
    /// Registers the request immediately; the returned handle resolves after
    /// the flush that carries it. Under the automatic policy, polling the
    /// handle arms that flush. A repeat of an earlier request returns a
    /// handle to the existing slot and triggers no new work.
    pub fn load(&self, filter: Option<ChildFilter>, key: PrimaryKey) -> PendingLoad {
        self.inner.load(LoadRequest::new(filter, key))
    }

    /// Requests several loads at once.
    ///
    /// All requests are registered before this returns. The future yields one
    /// result per request, in request order.
    pub fn load_many<I>(&self, requests: I) -> impl Future<Output = Vec<LoadResult>> + Send + 'static
    where
        I: IntoIterator<Item = LoadRequest>,
    {
        let pending: Vec<PendingLoad> = requests
            .into_iter()
            .map(|request| self.inner.load(request))
            .collect();
        join_all(pending)
    }

    /// Seeds the slot for `(filter, key)` with a known result.
    ///
    /// Returns `false` and changes nothing if the slot already exists or the
    /// scope is cancelled.
    pub fn prime(
        &self,
        filter: Option<ChildFilter>,
        key: PrimaryKey,
        children: Vec<ChildRecord>,
    ) -> bool {
        let mut state = self.inner.state.lock();
        if state.cancelled {
            return false;
        }
        let request = LoadRequest::new(filter, key);
        if state.slots.contains_key(&request) {
            return false;
        }
        state.slots.insert(request, resolved_slot(Ok(children)));
        true
    }

    /// Dispatches every queued request now.
    ///
    /// Groups execute concurrently; the returned future completes once all of
    /// them have. Callers waiting on a group are woken as soon as that group
    /// is done. A no-op when nothing is queued.
    pub async fn flush(&self) -> FlushReport {
        self.inner.flush().await
    }

    /// Rejects every unresolved load with [`LoadError::Cancelled`] and stops
    /// accepting work. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Whether [`cancel()`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().cancelled
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> ScopeStats {
        let state = self.inner.state.lock();
        ScopeStats {
            slots: state.slots.len(),
            queued: state.queue.len(),
            in_flight: state.in_flight.len(),
            windows: state.windows,
            groups_dispatched: state.groups_dispatched,
        }
    }
}

impl Drop for LoadScope {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl std::fmt::Debug for LoadScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadScope")
            .field("id", &self.inner.id)
            .field("stats", &self.stats())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use coalesce_core::ChildStore;
    use futures_util::FutureExt;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::storage::MemoryStore;

    /// Wraps a [`MemoryStore`] and holds every fetch until a permit is released.
    struct GatedStore {
        inner: MemoryStore,
        gate: Semaphore,
        started: AtomicU64,
    }

    impl GatedStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                gate: Semaphore::new(0),
                started: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl ChildStore for GatedStore {
        async fn fetch_children(
            &self,
            parent_keys: &[PrimaryKey],
            filter: Option<&ChildFilter>,
        ) -> anyhow::Result<Vec<ChildRecord>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await?.forget();
            self.inner.fetch_children(parent_keys, filter).await
        }
    }

    fn manual_scope(store: Arc<dyn ChildStore>) -> LoadScope {
        let config = LoaderConfig::manual();
        LoadScope::new(1, Arc::new(BatchExecutor::new(store, &config)), &config)
    }

    fn book() -> Option<ChildFilter> {
        Some(ChildFilter::title_contains("Book"))
    }

    #[tokio::test]
    async fn one_fetch_per_distinct_filter() {
        let store = Arc::new(MemoryStore::seeded_library(10, 1));
        let scope = manual_scope(store.clone());

        let pending: Vec<_> = (1..=10)
            .map(|key| scope.load(if key <= 6 { None } else { book() }, key))
            .collect();
        let report = scope.flush().await;

        assert_eq!(report.requests, 10);
        assert_eq!(report.groups, 2);
        assert_eq!(store.fetch_count(), 2);
        for (key, load) in (1..=10).zip(pending) {
            assert_eq!(load.await.unwrap()[0].parent_key, key);
        }
    }

    #[tokio::test]
    async fn duplicate_loads_share_one_slot() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let scope = manual_scope(store.clone());

        let a = scope.load(None, 1);
        let b = scope.load(None, 1);
        assert_eq!(scope.stats().queued, 1);
        scope.flush().await;

        assert_eq!(a.await.unwrap(), b.await.unwrap());
        assert_eq!(store.fetch_log()[0].keys, vec![1]);
    }

    #[tokio::test]
    async fn dedup_spans_flush_windows() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let scope = manual_scope(store.clone());

        let first = scope.load(None, 1);
        scope.flush().await;
        let first = first.await.unwrap();

        let again = scope.load(None, 1);
        assert_eq!(scope.flush().await, FlushReport::default());
        assert_eq!(again.await.unwrap(), first);
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(scope.stats().windows, 1);
    }

    #[tokio::test]
    async fn later_windows_group_independently() {
        let store = Arc::new(MemoryStore::seeded_library(3, 1));
        let scope = manual_scope(store.clone());

        let a = scope.load(None, 1);
        scope.flush().await;
        let b = scope.load(None, 2);
        let c = scope.load(book(), 3);
        let report = scope.flush().await;

        assert_eq!(report.window, 2);
        assert_eq!(report.groups, 2);
        assert_eq!(store.fetch_count(), 3);
        assert!(a.await.is_ok() && b.await.is_ok() && c.await.is_ok());
    }

    #[tokio::test]
    async fn missing_key_resolves_empty() {
        let scope = manual_scope(Arc::new(MemoryStore::seeded_library(1, 1)));
        let load = scope.load(None, 42);
        scope.flush().await;
        assert!(load.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_group() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        store.fail_on(book());
        let scope = manual_scope(store);

        let bad = scope.load(book(), 1);
        let good = scope.load(None, 1);
        let report = scope.flush().await;

        assert_eq!(report.failed_groups, 1);
        assert!(bad.await.unwrap_err().is_backend());
        assert_eq!(good.await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn failures_are_memoized_for_the_scope() {
        let store = Arc::new(MemoryStore::seeded_library(1, 1));
        store.fail_on(None);
        let scope = manual_scope(store.clone());

        let first = scope.load(None, 1);
        scope.flush().await;
        assert!(first.await.is_err());

        store.clear_failures();
        let second = scope.load(None, 1);
        scope.flush().await;
        assert!(second.await.is_err());
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn load_many_preserves_order() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let scope = manual_scope(store.clone());

        let results = scope.load_many(vec![
            LoadRequest::unfiltered(1),
            LoadRequest::new(book(), 2),
            LoadRequest::unfiltered(1),
        ]);
        scope.flush().await;
        let results = results.await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), results[2].as_ref().unwrap());
        assert_eq!(results[1].as_ref().unwrap()[0].id, 6);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn prime_skips_the_fetch() {
        let store = Arc::new(MemoryStore::seeded_library(1, 1));
        let scope = manual_scope(store.clone());

        assert!(scope.prime(None, 7, Vec::new()));
        assert!(!scope.prime(None, 7, Vec::new()));
        let load = scope.load(None, 7);
        assert_eq!(scope.flush().await, FlushReport::default());
        assert!(load.await.unwrap().is_empty());
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn prime_never_replaces_an_existing_slot() {
        let scope = manual_scope(Arc::new(MemoryStore::seeded_library(1, 2)));
        let load = scope.load(None, 1);
        assert!(!scope.prime(None, 1, Vec::new()));
        scope.flush().await;
        assert_eq!(load.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancel_rejects_queued_loads() {
        let store = Arc::new(MemoryStore::seeded_library(1, 1));
        let scope = manual_scope(store.clone());

        let load = scope.load(None, 1);
        scope.cancel();
        assert!(matches!(load.await, Err(LoadError::Cancelled)));
        assert!(matches!(scope.load(None, 2).await, Err(LoadError::Cancelled)));
        assert_eq!(scope.flush().await, FlushReport::default());
        assert_eq!(store.fetch_count(), 0);
        assert!(!scope.prime(None, 3, Vec::new()));
    }

    #[tokio::test]
    async fn cancel_discards_in_flight_results() {
        let store = Arc::new(GatedStore::new(MemoryStore::seeded_library(1, 1)));
        let scope = Arc::new(manual_scope(store.clone()));

        let load = scope.load(None, 1);
        let flusher = {
            let scope = Arc::clone(&scope);
            tokio::spawn(async move { scope.flush().await })
        };
        while store.started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(scope.stats().in_flight, 1);

        scope.cancel();
        assert!(matches!(load.await, Err(LoadError::Cancelled)));

        // The fetch itself is allowed to finish.
        store.gate.add_permits(1);
        let report = flusher.await.unwrap();
        assert_eq!(report.failed_groups, 0);
        assert_eq!(store.inner.fetch_count(), 1);
    }

    #[tokio::test]
    async fn dropping_the_scope_cancels() {
        let scope = manual_scope(Arc::new(MemoryStore::seeded_library(1, 1)));
        let load = scope.load(None, 1);
        drop(scope);
        assert!(matches!(load.await, Err(LoadError::Cancelled)));
    }

    #[tokio::test]
    async fn concurrent_duplicate_while_in_flight_reuses_slot() {
        let store = Arc::new(GatedStore::new(MemoryStore::seeded_library(1, 3)));
        let scope = Arc::new(manual_scope(store.clone()));

        let first = scope.load(None, 1);
        let flusher = {
            let scope = Arc::clone(&scope);
            tokio::spawn(async move { scope.flush().await })
        };
        while store.started.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = scope.load(None, 1);
        assert_eq!(scope.stats().queued, 0);

        store.gate.add_permits(1);
        flusher.await.unwrap();
        assert_eq!(first.await.unwrap(), second.await.unwrap());
        assert_eq!(store.inner.fetch_count(), 1);
    }

    fn auto_scope(store: Arc<dyn ChildStore>, delay_ms: u64) -> LoadScope {
        let config = LoaderConfig {
            flush_policy: FlushPolicy::Auto { delay_ms },
            ..LoaderConfig::default()
        };
        LoadScope::new(1, Arc::new(BatchExecutor::new(store, &config)), &config)
    }

    #[tokio::test]
    async fn auto_policy_flushes_once_the_caller_awaits() {
        let store = Arc::new(MemoryStore::seeded_library(10, 1));
        let scope = auto_scope(store.clone(), 0);

        let results = scope
            .load_many((1..=10).map(|key| {
                LoadRequest::new(if key % 2 == 0 { book() } else { None }, key)
            }))
            .await;

        assert_eq!(results.len(), 10);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(scope.stats().windows, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn auto_policy_never_flushes_unpolled_loads() {
        let store = Arc::new(MemoryStore::seeded_library(4, 1));
        let scope = auto_scope(store.clone(), 0);

        let results = scope.load_many((1..=2000).map(|key| {
            LoadRequest::new(if key % 2 == 0 { book() } else { None }, key)
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(scope.stats().queued, 2000);
        assert_eq!(store.fetch_count(), 0);

        let results = results.await;
        assert_eq!(results.len(), 2000);
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(scope.stats().windows, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_flush_disarms_the_pending_timer() {
        let store = Arc::new(MemoryStore::seeded_library(2, 1));
        let scope = auto_scope(store.clone(), 100);

        let first = scope.load(None, 1);
        assert!(first.clone().now_or_never().is_none());
        scope.flush().await;
        assert_eq!(first.await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = scope.load(None, 2);
        assert!(second.clone().now_or_never().is_none());

        // The first timer expires here; the second window is not due yet.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(scope.stats().queued, 1);
        assert_eq!(scope.stats().windows, 1);

        assert_eq!(second.await.unwrap().len(), 1);
        assert_eq!(scope.stats().windows, 2);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn auto_policy_opens_a_new_window_for_follow_up_loads() {
        let store = Arc::new(MemoryStore::seeded_library(2, 5));
        let scope = auto_scope(store.clone(), 0);

        let (a, b) = tokio::join!(scope.load(None, 1), scope.load(None, 2));
        assert_eq!(a.unwrap().len() + b.unwrap().len(), 10);
        let c = scope.load(book(), 1).await.unwrap();

        assert_eq!(c.len(), 5);
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(scope.stats().windows, 2);
    }

    #[test]
    fn auto_policy_without_runtime_waits_for_explicit_flush() {
        let store = Arc::new(MemoryStore::seeded_library(1, 1));
        let scope = auto_scope(store.clone(), 0);

        let load = scope.load(None, 1);
        assert!(load.clone().now_or_never().is_none());
        assert_eq!(scope.stats().queued, 1);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            scope.flush().await;
            assert_eq!(load.await.unwrap().len(), 1);
        });
        assert_eq!(store.fetch_count(), 1);
    }
}

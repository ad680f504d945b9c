//! Result slots: the shared, awaitable outcome of one `(filter, key)` request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use coalesce_core::ChildRecord;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::oneshot;

use super::ScopeInner;
use crate::error::LoadError;

/// What a load resolves to.
pub type LoadResult = Result<Vec<ChildRecord>, LoadError>;

pub(crate) type SharedResult = Shared<BoxFuture<'static, LoadResult>>;

/// Creates an unresolved slot and the sender that resolves it.
///
/// Dropping the sender without sending resolves the slot as
/// [`LoadError::Cancelled`].
pub(crate) fn pending_slot() -> (oneshot::Sender<LoadResult>, SharedResult) {
    let (tx, rx) = oneshot::channel();
    let shared = rx
        .map(|received| received.unwrap_or(Err(LoadError::Cancelled)))
        .boxed()
        .shared();
    (tx, shared)
}

/// Creates a slot that is already resolved with `result`.
pub(crate) fn resolved_slot(result: LoadResult) -> SharedResult {
    futures_util::future::ready(result).boxed().shared()
}

/// Asks the owning scope to dispatch one flush window.
///
/// Fired on the first poll of a handle, i.e. once the registering task has
/// stopped issuing loads and started waiting.
#[derive(Clone)]
pub(crate) struct FlushTrigger {
    pub(crate) scope: Weak<ScopeInner>,
    pub(crate) generation: u64,
}

/// Handle to a load that resolves once its batch group has been fetched.
///
/// Every handle for the same `(filter, key)` within a scope observes the
/// same outcome; awaiting one does not consume it for the others.
#[derive(Clone)]
#[must_use = "a pending load does nothing unless awaited"]
pub struct PendingLoad {
    inner: SharedResult,
    trigger: Option<FlushTrigger>,
}

impl PendingLoad {
    pub(crate) fn new(inner: SharedResult) -> Self {
        Self {
            inner,
            trigger: None,
        }
    }

    pub(crate) fn with_trigger(inner: SharedResult, trigger: FlushTrigger) -> Self {
        Self {
            inner,
            trigger: Some(trigger),
        }
    }

    /// The outcome, if the slot has already resolved and been polled.
    #[must_use]
    pub fn peek(&self) -> Option<&LoadResult> {
        self.inner.peek()
    }
}

impl Future for PendingLoad {
    type Output = LoadResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Poll::Ready(result) = self.inner.poll_unpin(cx) {
            return Poll::Ready(result);
        }
        if let Some(FlushTrigger { scope, generation }) = self.trigger.take() {
            if let Some(scope) = scope.upgrade() {
                scope.request_flush(generation);
            }
        }
        Poll::Pending
    }
}

impl std::fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoad")
            .field("resolved", &self.inner.peek().is_some())
            .finish()
    }
}

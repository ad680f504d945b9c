//! Coalesce Loader: scoped request coalescing for parent/child lookups.
//!
//! Collapses the N+1 query pattern: loads issued during one logical operation
//! are buffered in a [`LoadScope`], grouped by filter, and answered with one
//! store fetch per group.

pub mod batch;
pub mod config;
pub mod error;
pub mod resolve;
pub mod scope;
pub mod storage;
pub mod telemetry;

pub use batch::{load_batch, BatchExecutor, BatchGroup};
pub use config::{FlushPolicy, LoaderConfig};
pub use error::LoadError;
pub use resolve::{resolve_parents, ParentNode, ResolvedParent};
pub use scope::{FlushReport, LoadResult, LoadScope, LoaderFactory, PendingLoad, ScopeStats};

//! Persistence store adapters for the loader.
//!
//! Concrete implementations of [`ChildStore`](coalesce_core::ChildStore) and
//! [`ParentStore`](coalesce_core::ParentStore):
//!
//! - [`MemoryStore`]: insertion-ordered tables with fetch accounting
//! - [`NullStore`]: no rows at all
//! - `PgStore` (feature `postgres`): `sqlx` over a `PostgreSQL` pool

mod memory;
mod null;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::{FetchCall, MemoryStore};
pub use null::NullStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgStoreConfig};

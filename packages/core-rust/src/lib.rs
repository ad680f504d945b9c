//! Coalesce Core: load request model, child filters, and persistence store traits.

pub mod traits;
pub mod types;

pub use traits::{ChildStore, ParentStore};
pub use types::{ChildFilter, ChildRecord, LoadRequest, ParentRecord, PrimaryKey};

use serde::{Deserialize, Serialize};

/// Primary key of a parent entity. Child records reference it via `parent_key`.
pub type PrimaryKey = i64;

/// A child row as read from the persistence store.
///
/// Treated as an immutable snapshot taken at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRecord {
    /// Identifier of the child row.
    pub id: PrimaryKey,
    /// Key of the parent this child belongs to.
    pub parent_key: PrimaryKey,
    /// Text attribute that filters are evaluated against.
    pub title: String,
}

/// A parent row (the entity whose children are lazily resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRecord {
    /// Identifier of the parent row.
    pub id: PrimaryKey,
    /// Display name.
    pub name: String,
}

/// Auxiliary filter carried by a load request.
///
/// Compared and hashed by value: two independently constructed filters with
/// the same contents land in the same batch group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildFilter {
    /// Case-insensitive substring match on the child's title.
    TitleContains(String),
}

impl ChildFilter {
    /// Shorthand for [`ChildFilter::TitleContains`].
    #[must_use]
    pub fn title_contains(needle: impl Into<String>) -> Self {
        Self::TitleContains(needle.into())
    }

    /// Evaluates the filter against a record.
    ///
    /// Stores that cannot push the predicate down use this to apply it in memory.
    #[must_use]
    pub fn matches(&self, record: &ChildRecord) -> bool {
        match self {
            Self::TitleContains(needle) => record
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

impl std::fmt::Display for ChildFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleContains(needle) => write!(f, "title ~* {needle:?}"),
        }
    }
}

/// A single request for the children of `key`, optionally restricted by `filter`.
///
/// The pair `(filter, key)` is the request's identity: equal requests within
/// one scope share a single result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    /// Optional restriction on which children are returned.
    pub filter: Option<ChildFilter>,
    /// Parent key whose children are requested.
    pub key: PrimaryKey,
}

impl LoadRequest {
    /// Creates a request for the children of `key` under `filter`.
    #[must_use]
    pub fn new(filter: Option<ChildFilter>, key: PrimaryKey) -> Self {
        Self { filter, key }
    }

    /// Creates a request with no filter.
    #[must_use]
    pub fn unfiltered(key: PrimaryKey) -> Self {
        Self { filter: None, key }
    }
}

impl From<(Option<ChildFilter>, PrimaryKey)> for LoadRequest {
    fn from((filter, key): (Option<ChildFilter>, PrimaryKey)) -> Self {
        Self { filter, key }
    }
}

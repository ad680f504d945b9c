//! `PostgreSQL` store backed by `sqlx`.
//!
//! Each batch group becomes one `SELECT ... WHERE parent = ANY($1)` query, with
//! the title filter pushed down as `ILIKE`.

use async_trait::async_trait;
use coalesce_core::{ChildFilter, ChildRecord, ChildStore, ParentRecord, ParentStore, PrimaryKey};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Table and column names the store queries.
///
/// Defaults match an `author` / `book` schema where `book.author_id`
/// references `author.id`.
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub parent_table: String,
    pub parent_name_column: String,
    pub child_table: String,
    pub parent_key_column: String,
    pub title_column: String,
    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for PgStoreConfig {
    fn default() -> Self {
        Self {
            parent_table: "author".to_string(),
            parent_name_column: "name".to_string(),
            child_table: "book".to_string(),
            parent_key_column: "author_id".to_string(),
            title_column: "title".to_string(),
            max_connections: 5,
        }
    }
}

impl PgStoreConfig {
    fn children_sql(&self, filtered: bool) -> String {
        let mut sql = format!(
            "SELECT id, {parent}, {title} FROM {table} WHERE {parent} = ANY($1)",
            parent = quote_ident(&self.parent_key_column),
            title = quote_ident(&self.title_column),
            table = quote_ident(&self.child_table),
        );
        if filtered {
            sql.push_str(&format!(
                " AND {} ILIKE $2 ESCAPE '\\'",
                quote_ident(&self.title_column)
            ));
        }
        sql.push_str(" ORDER BY id");
        sql
    }

    fn parents_sql(&self) -> String {
        format!(
            "SELECT id, {name} FROM {table} ORDER BY id",
            name = quote_ident(&self.parent_name_column),
            table = quote_ident(&self.parent_table),
        )
    }
}

/// Read-only store over a `PostgreSQL` connection pool.
pub struct PgStore {
    pool: PgPool,
    config: PgStoreConfig,
}

impl PgStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, config: PgStoreConfig) -> Self {
        Self { pool, config }
    }

    /// Opens a pool against `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection cannot be established.
    pub async fn connect(url: &str, config: PgStoreConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool, config))
    }
}

#[async_trait]
impl ChildStore for PgStore {
    async fn fetch_children(
        &self,
        parent_keys: &[PrimaryKey],
        filter: Option<&ChildFilter>,
    ) -> anyhow::Result<Vec<ChildRecord>> {
        let keys = parent_keys.to_vec();
        let rows: Vec<(i64, i64, String)> = match filter {
            Some(ChildFilter::TitleContains(needle)) => {
                let sql = self.config.children_sql(true);
                sqlx::query_as(&sql)
                    .bind(keys)
                    .bind(like_pattern(needle))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = self.config.children_sql(false);
                sqlx::query_as(&sql).bind(keys).fetch_all(&self.pool).await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|(id, parent_key, title)| ChildRecord {
                id,
                parent_key,
                title,
            })
            .collect())
    }
}

#[async_trait]
impl ParentStore for PgStore {
    async fn fetch_parents(&self) -> anyhow::Result<Vec<ParentRecord>> {
        let sql = self.config.parents_sql();
        let rows: Vec<(i64, String)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| ParentRecord { id, name })
            .collect())
    }
}

/// Wraps `needle` in `%` after escaping `LIKE` metacharacters.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

//! SQLite storage for media groups.
//!
//! One row per group key, holding the group's fragments as a JSON array.

use std::time::{SystemTime, UNIX_EPOCH};

use {
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::info,
};

use mediagroups_engine::{Error, Fragment, GroupBackend, Result};

/// SQLite-backed [`GroupBackend`].
pub struct SqliteBackend {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl SqliteBackend {
    /// Wrap an existing pool. The schema must already exist (see [`Self::init`]).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url` and make sure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(url)
            .await
            .map_err(|e| Error::backend(format!("connect {url}"), e))?;
        Self::init(&pool).await?;
        info!(url, "media group store ready");
        Ok(Self::new(pool))
    }

    /// Create the `media_groups` table if it does not exist.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS media_groups (
                group_key  TEXT    PRIMARY KEY,
                fragments  TEXT    NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::backend("create media_groups table", e))?;
        Ok(())
    }
}

#[async_trait]
impl GroupBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<Fragment>>> {
        let row = sqlx::query_scalar::<_, String>(
            "SELECT fragments FROM media_groups WHERE group_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::backend(format!("read media group {key}"), e))?;
        row.map(|raw| serde_json::from_str(&raw).map_err(Error::from))
            .transpose()
    }

    async fn write(&self, key: &str, fragments: &[Fragment]) -> Result<()> {
        let raw = serde_json::to_string(fragments)?;
        sqlx::query(
            r#"INSERT INTO media_groups (group_key, fragments, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(group_key) DO UPDATE SET
                 fragments = excluded.fragments,
                 updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(&raw)
        .bind(now_ms())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::backend(format!("write media group {key}"), e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM media_groups WHERE group_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::backend(format!("delete media group {key}"), e))?;
        Ok(())
    }
}

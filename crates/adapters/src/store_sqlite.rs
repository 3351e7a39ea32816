//! SQLite post store implementation

use async_trait::async_trait;
use gentle_post_domain::{
    AttachmentRef, PostContent, PostOrder, PostRecord, PostStore, StoreError,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, owner, text, transformed, label, score, attachment, created_at FROM posts";

type PostRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<String>,
    i64,
);

/// SQLite-backed post store
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    /// Open (or create) the database at `db_path` and apply migrations
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        // created_at holds unix nanoseconds so ORDER BY is chronological
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                text TEXT,
                transformed TEXT,
                label TEXT,
                score REAL,
                attachment TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_owner_created
            ON posts(owner, created_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn fetch_ordered(
        &self,
        owner: Option<&str>,
        order: PostOrder,
    ) -> Result<Vec<PostRecord>, StoreError> {
        let direction = match order {
            PostOrder::Newest => "DESC",
            PostOrder::Oldest => "ASC",
        };
        let filter = if owner.is_some() { " WHERE owner = ?" } else { "" };
        let sql = format!(
            "{}{} ORDER BY created_at {dir}, rowid {dir}",
            SELECT_COLUMNS,
            filter,
            dir = direction
        );

        let mut query = sqlx::query_as::<_, PostRow>(&sql);
        if let Some(owner) = owner {
            query = query.bind(owner);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_record).collect()
    }
}

fn timestamp_to_nanos(ts: OffsetDateTime) -> Result<i64, StoreError> {
    i64::try_from(ts.unix_timestamp_nanos())
        .map_err(|_| StoreError::Serialization(format!("Timestamp out of range: {}", ts)))
}

fn row_to_record(row: PostRow) -> Result<PostRecord, StoreError> {
    let (id, owner, text, transformed, label, score, attachment, created_at) = row;

    let id = Uuid::parse_str(&id).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let created_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(created_at))
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(PostRecord {
        id,
        owner,
        content: PostContent {
            text,
            transformed,
            label,
            score,
        },
        attachment: attachment.map(AttachmentRef::new),
        created_at,
    })
}

fn not_found_if_untouched(
    result: sqlx::sqlite::SqliteQueryResult,
    id: Uuid,
) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn insert(&self, record: &PostRecord) -> Result<(), StoreError> {
        let created_at = timestamp_to_nanos(record.created_at)?;

        sqlx::query(
            r#"
            INSERT INTO posts
            (id, owner, text, transformed, label, score, attachment, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.owner)
        .bind(&record.content.text)
        .bind(&record.content.transformed)
        .bind(&record.content.label)
        .bind(record.content.score)
        .bind(record.attachment.as_ref().map(|a| a.as_str()))
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);

        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(row_to_record).transpose()
    }

    async fn apply_edit(
        &self,
        id: Uuid,
        content: Option<&PostContent>,
        attachment: Option<Option<&AttachmentRef>>,
    ) -> Result<(), StoreError> {
        let mut assignments = Vec::new();
        if content.is_some() {
            assignments.push("text = ?, transformed = ?, label = ?, score = ?");
        }
        if attachment.is_some() {
            assignments.push("attachment = ?");
        }
        if assignments.is_empty() {
            // Nothing to change, but a missing row must still be reported
            assignments.push("id = id");
        }

        let sql = format!("UPDATE posts SET {} WHERE id = ?", assignments.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(content) = content {
            query = query
                .bind(&content.text)
                .bind(&content.transformed)
                .bind(&content.label)
                .bind(content.score);
        }
        if let Some(attachment) = attachment {
            query = query.bind(attachment.map(|a| a.as_str()));
        }

        let result = query
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        not_found_if_untouched(result, id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        not_found_if_untouched(result, id)
    }

    async fn list_by_owner(
        &self,
        owner: &str,
        order: PostOrder,
    ) -> Result<Vec<PostRecord>, StoreError> {
        self.fetch_ordered(Some(owner), order).await
    }

    async fn list_all(&self, order: PostOrder) -> Result<Vec<PostRecord>, StoreError> {
        self.fetch_ordered(None, order).await
    }
}

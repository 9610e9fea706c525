use {async_trait::async_trait, sqlx::SqlitePool};

use crate::{ImageRecord, Result};

/// Trait for persisting image records. Implementations can be SQLite,
/// in-memory, etc.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Number of live records.
    async fn count(&self) -> Result<i64>;
    /// Highest identifier currently assigned, or `None` when empty.
    async fn max_id(&self) -> Result<Option<i64>>;
    /// Insert a record with a caller-chosen identifier.
    async fn insert(&self, record: ImageRecord) -> Result<()>;
    /// Assign the next identifier (max existing + 1, or 1 when empty) and
    /// persist the record in one atomic step.
    ///
    /// Concurrent callers are guaranteed pairwise-distinct, gap-free
    /// identifiers.
    async fn allocate(&self, storage_path: &str) -> Result<ImageRecord>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ImageRecord>>;
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Stores image records in a SQLite database.
pub struct SqliteImageStore {
    pool: SqlitePool,
}

impl SqliteImageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the images table schema.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS images (
                id           INTEGER PRIMARY KEY,
                storage_path TEXT    NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ImageStore for SqliteImageStore {
    async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn max_id(&self) -> Result<Option<i64>> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(id) FROM images")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn insert(&self, record: ImageRecord) -> Result<()> {
        sqlx::query("INSERT INTO images (id, storage_path) VALUES (?, ?)")
            .bind(record.id)
            .bind(&record.storage_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn allocate(&self, storage_path: &str) -> Result<ImageRecord> {
        // Single statement: the max+1 read and the insert cannot interleave
        // with a concurrent allocation under SQLite's writer lock. The
        // PRIMARY KEY constraint backstops the invariant.
        let row: ImageRow = sqlx::query_as(
            r#"INSERT INTO images (id, storage_path)
               SELECT COALESCE(MAX(id), 0) + 1, ? FROM images
               RETURNING id, storage_path"#,
        )
        .bind(storage_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ImageRecord>> {
        let row: Option<ImageRow> =
            sqlx::query_as("SELECT id, storage_path FROM images WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ImageRow {
    id: i64,
    storage_path: String,
}

impl From<ImageRow> for ImageRecord {
    fn from(r: ImageRow) -> Self {
        Self {
            id: r.id,
            storage_path: r.storage_path,
        }
    }
}

//! File metadata types and repository for EUCLOUD file management.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::Result;

const FILE_COLUMNS: &str = "id, owner_id, folder_id, filename, storage_key, file_size, mime_type, \
                            thumbnail_key, is_deleted, deleted_at, created_at";

/// Metadata for a stored file.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Parent folder ID (None = root).
    pub folder_id: Option<i64>,
    /// Display name.
    pub filename: String,
    /// Opaque blob key (UUID.ext).
    pub storage_key: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type guessed from the display name.
    pub mime_type: Option<String>,
    /// Thumbnail blob key, for images.
    pub thumbnail_key: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the file was soft-deleted.
    pub deleted_at: Option<String>,
    /// When the file was created.
    pub created_at: String,
}

impl FileRecord {
    /// Stored MIME type or the generic binary fallback.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}

/// Data for creating a new file row.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: i64,
    pub folder_id: Option<i64>,
    pub filename: String,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub thumbnail_key: Option<String>,
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a file row on an open transaction.
    pub async fn insert(conn: &mut SqliteConnection, file: &NewFile) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (owner_id, folder_id, filename, storage_key, file_size, mime_type, thumbnail_key)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {FILE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(file.owner_id)
            .bind(file.folder_id)
            .bind(&file.filename)
            .bind(&file.storage_key)
            .bind(file.file_size)
            .bind(&file.mime_type)
            .bind(&file.thumbnail_key)
            .fetch_one(conn)
            .await?;
        Ok(record)
    }

    /// Get a file by ID if `owner_id` owns it, including soft-deleted files.
    pub async fn get_owned(&self, id: i64, owner_id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND owner_id = ?");
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Re-read a file on an open transaction.
    pub async fn get_in(conn: &mut SqliteConnection, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(record)
    }

    /// List the user's non-deleted files directly in `folder_id` (None = root).
    pub async fn list_by_folder(
        &self,
        owner_id: i64,
        folder_id: Option<i64>,
    ) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE owner_id = ? AND folder_id IS ? AND is_deleted = 0
             ORDER BY filename, id"
        );
        let records = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(owner_id)
            .bind(folder_id)
            .fetch_all(self.pool)
            .await?;
        Ok(records)
    }

    /// Change the display name and MIME type.
    pub async fn update_name(
        conn: &mut SqliteConnection,
        id: i64,
        filename: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE files SET filename = ? WHERE id = ?")
            .bind(filename)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Move a file to another folder (None = root).
    pub async fn update_folder(
        conn: &mut SqliteConnection,
        id: i64,
        folder_id: Option<i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE files SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Mark a file deleted. Returns `false` if it already was.
    pub async fn soft_delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE files SET is_deleted = 1, deleted_at = datetime('now')
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count the user's files as `(active, soft_deleted)`.
    pub async fn counts(&self, owner_id: i64) -> Result<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(is_deleted = 0), 0), COALESCE(SUM(is_deleted = 1), 0)
             FROM files WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }

    /// Total size of every file row the user owns, deleted or not.
    pub async fn total_size(&self, owner_id: i64) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(file_size), 0) FROM files WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(self.pool)
                .await?;
        Ok(total)
    }
}

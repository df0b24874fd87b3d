//! User repository for EUCLOUD.
//!
//! CRUD operations for users plus the quota counter updates that run
//! inside lifecycle transactions.

use sqlx::SqliteConnection;

use super::user::{NewUser, User};
use super::DbPool;
use crate::{EucloudError, Result};

const USER_COLUMNS: &str = "id, email, password_hash, storage_quota, storage_used, created_at";

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// A duplicate email surfaces as [`EucloudError::Conflict`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, storage_quota) VALUES (?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.storage_quota)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                EucloudError::Conflict("Email already registered".to_string())
            }
            other => EucloudError::from(other),
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| EucloudError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Charge `bytes` against a user's quota inside an open transaction.
    ///
    /// The check and the increment are one conditional UPDATE, so two
    /// concurrent writers can never both pass against a stale counter.
    /// Returns `false` (and changes nothing) when the quota would be exceeded.
    pub async fn reserve_storage(
        conn: &mut SqliteConnection,
        user_id: i64,
        bytes: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET storage_used = storage_used + ?
             WHERE id = ? AND storage_used + ? <= storage_quota",
        )
        .bind(bytes)
        .bind(user_id)
        .bind(bytes)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Set a user's quota.
    pub async fn set_quota(&self, user_id: i64, quota: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET storage_quota = ? WHERE id = ?")
            .bind(quota)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

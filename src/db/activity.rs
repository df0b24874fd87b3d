//! Activity log for EUCLOUD.
//!
//! Every state-changing file or folder operation appends one row here,
//! written inside the same transaction as the change it describes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::SqliteConnection;

use super::DbPool;
use crate::{EucloudError, Result};

/// Kind of logged activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Upload,
    Download,
    Rename,
    Delete,
    Move,
    Copy,
    CreateFolder,
}

impl ActivityKind {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Upload => "upload",
            ActivityKind::Download => "download",
            ActivityKind::Rename => "rename",
            ActivityKind::Delete => "delete",
            ActivityKind::Move => "move",
            ActivityKind::Copy => "copy",
            ActivityKind::CreateFolder => "create_folder",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = EucloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "upload" => Ok(ActivityKind::Upload),
            "download" => Ok(ActivityKind::Download),
            "rename" => Ok(ActivityKind::Rename),
            "delete" => Ok(ActivityKind::Delete),
            "move" => Ok(ActivityKind::Move),
            "copy" => Ok(ActivityKind::Copy),
            "create_folder" => Ok(ActivityKind::CreateFolder),
            other => Err(EucloudError::Validation(format!(
                "unknown activity type: {other}"
            ))),
        }
    }
}

/// A stored activity row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub file_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub activity_type: String,
    pub details: Option<String>,
    pub created_at: String,
}

impl Activity {
    /// Parsed activity kind, if the stored string is known.
    pub fn kind(&self) -> Option<ActivityKind> {
        self.activity_type.parse().ok()
    }
}

/// Data for appending an activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i64,
    pub file_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub kind: ActivityKind,
    pub details: String,
}

impl NewActivity {
    /// Activity about a file.
    pub fn file(user_id: i64, file_id: i64, kind: ActivityKind, details: impl Into<String>) -> Self {
        Self {
            user_id,
            file_id: Some(file_id),
            folder_id: None,
            kind,
            details: details.into(),
        }
    }

    /// Activity about a folder.
    pub fn folder(
        user_id: i64,
        folder_id: i64,
        kind: ActivityKind,
        details: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            file_id: None,
            folder_id: Some(folder_id),
            kind,
            details: details.into(),
        }
    }
}

/// Repository for the activity log.
pub struct ActivityRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new ActivityRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Append an activity on an open connection or transaction.
    pub async fn log(conn: &mut SqliteConnection, activity: &NewActivity) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO activities (user_id, file_id, folder_id, activity_type, details)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(activity.user_id)
        .bind(activity.file_id)
        .bind(activity.folder_id)
        .bind(activity.kind.as_str())
        .bind(&activity.details)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// List a user's most recent activities, newest first.
    pub async fn list_recent(&self, user_id: i64, limit: i64) -> Result<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT id, user_id, file_id, folder_id, activity_type, details, created_at
             FROM activities WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(activities)
    }

    /// Count a user's activities of one kind.
    pub async fn count_by_kind(&self, user_id: i64, kind: ActivityKind) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM activities WHERE user_id = ? AND activity_type = ?",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

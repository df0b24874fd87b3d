//! Response DTOs for the HTTP API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::{to_rfc3339, to_rfc3339_opt};
use crate::db::{Activity, User};
use crate::file::{FileRecord, Folder, StorageUsage};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain confirmation message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    /// Quota in bytes.
    pub storage_quota: i64,
    /// Bytes charged so far.
    pub storage_used: i64,
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            storage_quota: user.storage_quota,
            storage_used: user.storage_used,
            created_at: to_rfc3339(&user.created_at),
        }
    }
}

/// Register/login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Signed session token.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserInfo,
}

/// `GET /auth/me` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserInfo,
}

/// `GET /auth/validate` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user: UserInfo,
}

// ============================================================================
// Files and folders
// ============================================================================

/// File metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub folder_id: Option<i64>,
    /// A preview thumbnail exists.
    pub has_thumbnail: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            has_thumbnail: file.thumbnail_key.is_some(),
            deleted_at: to_rfc3339_opt(file.deleted_at.as_deref()),
            created_at: to_rfc3339(&file.created_at),
            filename: file.filename,
            file_size: file.file_size,
            mime_type: file.mime_type,
            folder_id: file.folder_id,
            is_deleted: file.is_deleted,
        }
    }
}

/// Folder metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            created_at: to_rfc3339(&folder.created_at),
            name: folder.name,
            parent_id: folder.parent_id,
        }
    }
}

/// A folder with its breadcrumbs.
#[derive(Debug, Serialize, ToSchema)]
pub struct FolderDetailResponse {
    pub folder: FolderResponse,
    /// Ancestors from the root down to the folder itself.
    pub path: Vec<FolderResponse>,
}

/// Contents of one folder level.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub folders: Vec<FolderResponse>,
}

// ============================================================================
// Storage
// ============================================================================

/// Quota summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub storage_quota: i64,
    pub storage_used: i64,
    pub storage_available: i64,
    /// Percentage of the quota in use, 0-100.
    pub usage_percent: f64,
    pub file_count: i64,
    pub folder_count: i64,
    pub trashed_count: i64,
}

impl From<StorageUsage> for UsageResponse {
    fn from(usage: StorageUsage) -> Self {
        let usage_percent = if usage.storage_quota > 0 {
            let pct = usage.storage_used as f64 * 100.0 / usage.storage_quota as f64;
            (pct * 100.0).round() / 100.0
        } else {
            0.0
        };
        Self {
            storage_quota: usage.storage_quota,
            storage_used: usage.storage_used,
            storage_available: usage.storage_available,
            usage_percent,
            file_count: usage.file_count,
            folder_count: usage.folder_count,
            trashed_count: usage.trashed_count,
        }
    }
}

/// One activity feed entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityResponse {
    pub id: i64,
    /// `upload`, `download`, `rename`, `delete`, `move`, `copy` or `create_folder`.
    pub activity_type: String,
    pub details: Option<String>,
    pub file_id: Option<i64>,
    pub folder_id: Option<i64>,
    pub created_at: String,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            created_at: to_rfc3339(&activity.created_at),
            activity_type: activity.activity_type,
            details: activity.details,
            file_id: activity.file_id,
            folder_id: activity.folder_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percent() {
        let usage = StorageUsage {
            storage_quota: 300,
            storage_used: 100,
            storage_available: 200,
            file_count: 1,
            folder_count: 0,
            trashed_count: 0,
        };
        let response = UsageResponse::from(usage);
        assert_eq!(response.usage_percent, 33.33);
    }

    #[test]
    fn test_usage_percent_zero_quota() {
        let usage = StorageUsage {
            storage_quota: 0,
            storage_used: 0,
            storage_available: 0,
            file_count: 0,
            folder_count: 0,
            trashed_count: 0,
        };
        assert_eq!(UsageResponse::from(usage).usage_percent, 0.0);
    }

    #[test]
    fn test_api_response_envelope() {
        let json = serde_json::to_value(ApiResponse::new(MessageResponse::new("ok"))).unwrap();
        assert_eq!(json["data"]["message"], "ok");
    }
}

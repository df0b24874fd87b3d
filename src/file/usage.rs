//! Storage usage and activity feed.

use serde::Serialize;

use crate::db::{Activity, ActivityRepository, Database, User};
use crate::Result;

use super::folder::FolderRepository;
use super::metadata::FileRepository;

/// Default number of activity entries returned.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// Largest number of activity entries returned.
pub const MAX_ACTIVITY_LIMIT: i64 = 200;

/// Quota counters and object counts for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub storage_quota: i64,
    pub storage_used: i64,
    pub storage_available: i64,
    pub file_count: i64,
    pub folder_count: i64,
    pub trashed_count: i64,
}

/// Read-only usage queries.
pub struct UsageService<'a> {
    db: &'a Database,
}

impl<'a> UsageService<'a> {
    /// Create a new UsageService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Usage summary for `user`.
    pub async fn usage(&self, user: &User) -> Result<StorageUsage> {
        let (file_count, trashed_count) = FileRepository::new(self.db.pool())
            .counts(user.id)
            .await?;
        let folder_count = FolderRepository::new(self.db.pool()).count(user.id).await?;

        Ok(StorageUsage {
            storage_quota: user.storage_quota,
            storage_used: user.storage_used,
            storage_available: user.storage_available(),
            file_count,
            folder_count,
            trashed_count,
        })
    }

    /// The user's newest activity entries, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_ACTIVITY_LIMIT`] and is clamped to
    /// `1..=MAX_ACTIVITY_LIMIT`.
    pub async fn recent_activity(&self, user: &User, limit: Option<i64>) -> Result<Vec<Activity>> {
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        ActivityRepository::new(self.db.pool())
            .list_recent(user.id, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ActivityKind, NewActivity, NewUser, UserRepository};

    async fn setup() -> (Database, User) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("usage@example.com", "hash", 1000))
            .await
            .unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_usage_empty_account() {
        let (db, user) = setup().await;
        let usage = UsageService::new(&db).usage(&user).await.unwrap();

        assert_eq!(
            usage,
            StorageUsage {
                storage_quota: 1000,
                storage_used: 0,
                storage_available: 1000,
                file_count: 0,
                folder_count: 0,
                trashed_count: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_recent_activity_limit_clamped() {
        let (db, user) = setup().await;
        let mut tx = db.begin().await.unwrap();
        for i in 0..5 {
            let activity = NewActivity {
                user_id: user.id,
                file_id: None,
                folder_id: None,
                kind: ActivityKind::Upload,
                details: format!("Uploaded {i}.txt"),
            };
            ActivityRepository::log(&mut tx, &activity).await.unwrap();
        }
        tx.commit().await.unwrap();

        let service = UsageService::new(&db);
        assert_eq!(service.recent_activity(&user, None).await.unwrap().len(), 5);
        assert_eq!(service.recent_activity(&user, Some(2)).await.unwrap().len(), 2);
        assert_eq!(service.recent_activity(&user, Some(0)).await.unwrap().len(), 1);
        assert_eq!(service.recent_activity(&user, Some(-3)).await.unwrap().len(), 1);
    }
}

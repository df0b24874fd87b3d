//! User model for EUCLOUD.

/// A registered user with storage quota counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login email (unique, stored lower-cased).
    pub email: String,
    /// Password hash (Argon2id PHC string).
    pub password_hash: String,
    /// Maximum cumulative size of the user's files, in bytes.
    pub storage_quota: i64,
    /// Bytes currently charged against the quota.
    pub storage_used: i64,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Bytes still available under the quota.
    pub fn storage_available(&self) -> i64 {
        (self.storage_quota - self.storage_used).max(0)
    }

    /// Check whether `additional_bytes` more would still fit in the quota.
    pub fn has_quota_for(&self, additional_bytes: i64) -> bool {
        self.storage_used
            .checked_add(additional_bytes)
            .is_some_and(|total| total <= self.storage_quota)
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email (already normalized).
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password_hash: String,
    /// Initial quota in bytes.
    pub storage_quota: i64,
}

impl NewUser {
    /// Create a new user record.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        storage_quota: i64,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            storage_quota,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(quota: i64, used: i64) -> User {
        User {
            id: 1,
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            storage_quota: quota,
            storage_used: used,
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_storage_available() {
        assert_eq!(user_with(100, 60).storage_available(), 40);
        assert_eq!(user_with(100, 100).storage_available(), 0);
    }

    #[test]
    fn test_has_quota_for() {
        let user = user_with(100, 60);
        assert!(user.has_quota_for(40));
        assert!(!user.has_quota_for(41));
        assert!(!user.has_quota_for(i64::MAX));
    }

    #[test]
    fn test_new_user() {
        let user = NewUser::new("a@example.com", "hash", 1024);
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.storage_quota, 1024);
    }
}

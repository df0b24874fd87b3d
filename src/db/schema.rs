//! Database schema and migrations for EUCLOUD.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users with storage quota counters
    r#"
CREATE TABLE users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash   TEXT NOT NULL,                      -- Argon2id PHC string
    storage_quota   INTEGER NOT NULL,
    storage_used    INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (storage_used >= 0)
);
"#,
    // v2: Per-owner folder tree
    r#"
CREATE TABLE folders (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    parent_id       INTEGER REFERENCES folders(id) ON DELETE CASCADE,  -- NULL = root
    name            TEXT NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_owner_parent ON folders(owner_id, parent_id);
"#,
    // v3: File metadata; blobs live on disk under storage_key
    r#"
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    folder_id       INTEGER REFERENCES folders(id) ON DELETE SET NULL,  -- NULL = root
    filename        TEXT NOT NULL,
    storage_key     TEXT NOT NULL UNIQUE,
    file_size       INTEGER NOT NULL,
    mime_type       TEXT,
    thumbnail_key   TEXT,
    is_deleted      INTEGER NOT NULL DEFAULT 0,
    deleted_at      TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_owner_folder ON files(owner_id, folder_id, is_deleted);
"#,
    // v4: Append-only activity log
    r#"
CREATE TABLE activities (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    file_id         INTEGER,    -- kept after the file or folder is gone
    folder_id       INTEGER,
    activity_type   TEXT NOT NULL,
    details         TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_activities_user_id ON activities(user_id, id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_activity_references_are_not_foreign_keys() {
        let activities = MIGRATIONS
            .iter()
            .find(|m| m.contains("CREATE TABLE activities"))
            .unwrap();
        assert!(!activities.contains("REFERENCES files"));
        assert!(!activities.contains("REFERENCES folders"));
    }

    #[test]
    fn test_users_migration_has_quota_columns() {
        let users = MIGRATIONS[0];
        assert!(users.contains("CREATE TABLE users"));
        assert!(users.contains("storage_quota"));
        assert!(users.contains("storage_used"));
        assert!(users.contains("COLLATE NOCASE"));
    }

    #[test]
    fn test_files_migration_has_soft_delete() {
        let files = MIGRATIONS[2];
        assert!(files.contains("CREATE TABLE files"));
        assert!(files.contains("is_deleted"));
        assert!(files.contains("deleted_at"));
        assert!(files.contains("storage_key     TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("CREATE TABLE") || migration.contains("ALTER TABLE"));
        }
    }
}

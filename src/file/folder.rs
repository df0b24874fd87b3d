//! Folder types and repository for EUCLOUD file management.
//!
//! Every query is scoped by owner; a folder owned by someone else is
//! indistinguishable from one that does not exist.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use super::MAX_FOLDER_DEPTH;
use crate::{EucloudError, Result};

const FOLDER_COLUMNS: &str = "id, owner_id, parent_id, name, created_at";

/// A folder in a user's tree.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// Folder name.
    pub name: String,
    /// When the folder was created.
    pub created_at: String,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

impl NewFolder {
    /// Create a new root-level NewFolder.
    pub fn new(owner_id: i64, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            parent_id: None,
            name: name.into(),
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a folder on an open transaction.
    pub async fn create(conn: &mut SqliteConnection, folder: &NewFolder) -> Result<Folder> {
        let sql = format!(
            "INSERT INTO folders (owner_id, parent_id, name) VALUES (?, ?, ?)
             RETURNING {FOLDER_COLUMNS}"
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(folder.owner_id)
            .bind(folder.parent_id)
            .bind(&folder.name)
            .fetch_one(conn)
            .await?;
        Ok(folder)
    }

    /// Get a folder by ID if `owner_id` owns it.
    pub async fn get_owned(&self, id: i64, owner_id: i64) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND owner_id = ?");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(folder)
    }

    /// Get an owned folder or fail with NotFound.
    pub async fn require_owned(&self, id: i64, owner_id: i64) -> Result<Folder> {
        self.get_owned(id, owner_id)
            .await?
            .ok_or_else(|| EucloudError::NotFound("folder".to_string()))
    }

    /// List every folder the user owns.
    pub async fn list_all(&self, owner_id: i64) -> Result<Vec<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = ? ORDER BY name, id");
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool)
            .await?;
        Ok(folders)
    }

    /// List the user's folders directly under `parent_id` (None = root).
    pub async fn list_by_parent(&self, owner_id: i64, parent_id: Option<i64>) -> Result<Vec<Folder>> {
        // `IS ?` matches NULL against NULL, unlike `=`.
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE owner_id = ? AND parent_id IS ? ORDER BY name, id"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(owner_id)
            .bind(parent_id)
            .fetch_all(self.pool)
            .await?;
        Ok(folders)
    }

    /// Rename a folder on an open transaction.
    pub async fn rename(conn: &mut SqliteConnection, id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Re-parent a folder on an open transaction.
    pub async fn set_parent(
        conn: &mut SqliteConnection,
        id: i64,
        parent_id: Option<i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete a folder on an open transaction.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get an owned folder on an open transaction.
    pub async fn get_in(
        conn: &mut SqliteConnection,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND owner_id = ?");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(conn)
            .await?;
        Ok(folder)
    }

    /// Take the database write lock through an owned folder's row.
    ///
    /// Returns `false` if the folder no longer exists for this owner.
    pub async fn lock(conn: &mut SqliteConnection, id: i64, owner_id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE folders SET parent_id = parent_id WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get the path from root to a folder.
    pub async fn get_path(&self, id: i64, owner_id: i64) -> Result<Vec<Folder>> {
        let mut conn = self.pool.acquire().await?;
        Self::path_in(&mut conn, id, owner_id).await
    }

    /// Get the path from root to a folder on an open transaction.
    pub async fn path_in(
        conn: &mut SqliteConnection,
        id: i64,
        owner_id: i64,
    ) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut current_id = Some(id);

        while let Some(folder_id) = current_id {
            if path.len() > MAX_FOLDER_DEPTH {
                return Err(EucloudError::Validation(
                    "folder tree is too deep".to_string(),
                ));
            }
            match Self::get_in(&mut *conn, folder_id, owner_id).await? {
                Some(folder) => {
                    current_id = folder.parent_id;
                    path.push(folder);
                }
                None => break,
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Check whether `candidate` is `ancestor` itself or lies below it.
    pub async fn is_within(
        conn: &mut SqliteConnection,
        candidate: i64,
        ancestor: i64,
        owner_id: i64,
    ) -> Result<bool> {
        let path = Self::path_in(conn, candidate, owner_id).await?;
        Ok(path.iter().any(|f| f.id == ancestor))
    }

    /// Check whether a folder has child folders or non-deleted files.
    pub async fn has_children(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let has: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE parent_id = ?)
                 OR EXISTS(SELECT 1 FROM files WHERE folder_id = ? AND is_deleted = 0)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(has)
    }

    /// Count the user's folders.
    pub async fn count(&self, owner_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};

    async fn setup_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice@example.com", "hash", 1000))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob@example.com", "hash", 1000))
            .await
            .unwrap();
        (db, alice.id, bob.id)
    }

    async fn create(db: &Database, owner: i64, name: &str, parent: Option<i64>) -> Folder {
        let mut conn = db.pool().acquire().await.unwrap();
        FolderRepository::create(&mut conn, &NewFolder::new(owner, name).with_parent(parent))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_owned() {
        let (db, alice, bob) = setup_db().await;
        let folder = create(&db, alice, "Documents", None).await;
        let repo = FolderRepository::new(db.pool());

        assert_eq!(folder.name, "Documents");
        assert!(folder.parent_id.is_none());
        assert!(repo.get_owned(folder.id, alice).await.unwrap().is_some());
        assert!(repo.get_owned(folder.id, bob).await.unwrap().is_none());
        assert!(matches!(
            repo.require_owned(folder.id, bob).await,
            Err(EucloudError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_parent() {
        let (db, alice, bob) = setup_db().await;
        let docs = create(&db, alice, "Documents", None).await;
        create(&db, alice, "Work", Some(docs.id)).await;
        create(&db, alice, "Photos", None).await;
        create(&db, bob, "Bob's", None).await;
        let repo = FolderRepository::new(db.pool());

        let root: Vec<String> = repo
            .list_by_parent(alice, None)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(root, vec!["Documents", "Photos"]);

        let children = repo.list_by_parent(alice, Some(docs.id)).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Work");

        assert_eq!(repo.list_all(alice).await.unwrap().len(), 3);
        assert_eq!(repo.count(bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_path_and_is_within() {
        let (db, alice, _) = setup_db().await;
        let a = create(&db, alice, "a", None).await;
        let b = create(&db, alice, "b", Some(a.id)).await;
        let c = create(&db, alice, "c", Some(b.id)).await;
        let other = create(&db, alice, "other", None).await;
        let repo = FolderRepository::new(db.pool());

        let path: Vec<i64> = repo
            .get_path(c.id, alice)
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(path, vec![a.id, b.id, c.id]);

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(FolderRepository::is_within(&mut conn, c.id, a.id, alice).await.unwrap());
        assert!(FolderRepository::is_within(&mut conn, a.id, a.id, alice).await.unwrap());
        assert!(!FolderRepository::is_within(&mut conn, a.id, c.id, alice).await.unwrap());
        assert!(!FolderRepository::is_within(&mut conn, other.id, a.id, alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_set_parent_delete() {
        let (db, alice, _) = setup_db().await;
        let a = create(&db, alice, "a", None).await;
        let b = create(&db, alice, "b", None).await;
        let repo = FolderRepository::new(db.pool());

        let mut tx = db.begin().await.unwrap();
        FolderRepository::rename(&mut tx, b.id, "renamed").await.unwrap();
        FolderRepository::set_parent(&mut tx, b.id, Some(a.id)).await.unwrap();
        tx.commit().await.unwrap();

        let b = repo.get_owned(b.id, alice).await.unwrap().unwrap();
        assert_eq!(b.name, "renamed");
        assert_eq!(b.parent_id, Some(a.id));

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(FolderRepository::has_children(&mut conn, a.id).await.unwrap());
        assert!(!FolderRepository::has_children(&mut conn, b.id).await.unwrap());
        assert!(FolderRepository::lock(&mut conn, a.id, alice).await.unwrap());
        assert!(FolderRepository::delete(&mut conn, b.id).await.unwrap());
        assert!(!FolderRepository::lock(&mut conn, b.id, alice).await.unwrap());
        assert!(!FolderRepository::delete(&mut conn, b.id).await.unwrap());
    }
}

//! File and folder services for EUCLOUD.
//!
//! This module provides the lifecycle operations:
//! - Upload and copy, charged against the owner's quota
//! - Download and preview with blob integrity checks
//! - Rename, move and soft-delete
//! - Folder create/rename/move/delete
//!
//! Every mutation commits its metadata change, quota update and activity
//! row in one transaction. Checks that a concurrent writer could invalidate
//! (quota, target folder, folder tree shape) are repeated inside that
//! transaction after its first write has taken the database write lock.

use sqlx::SqliteConnection;
use tracing::{error, info, warn};

use crate::config::StorageConfig;
use crate::db::{ActivityKind, ActivityRepository, Database, NewActivity, User, UserRepository};
use crate::{EucloudError, Result};

use super::folder::{Folder, FolderRepository, NewFolder};
use super::metadata::{FileRecord, FileRepository, NewFile};
use super::storage::{BlobStore, FileStorage};
use super::{guess_mime_type, thumbnail, validate_filename, validate_folder_name, COPY_PREFIX};

/// Upload limits taken from the storage config.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Lower-cased extensions accepted for display names.
    pub allowed_extensions: Vec<String>,
    /// Largest single upload, in bytes.
    pub max_upload_bytes: u64,
    /// Thumbnail bounding box.
    pub thumbnail_max_dimension: u32,
}

impl UploadPolicy {
    /// Build the policy from the storage config.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_upload_bytes: config.max_upload_size_bytes(),
            thumbnail_max_dimension: config.thumbnail_max_dimension,
        }
    }
}

/// Files and folders directly inside one folder.
#[derive(Debug, Clone)]
pub struct FileListing {
    pub files: Vec<FileRecord>,
    pub folders: Vec<Folder>,
}

/// Bytes served by download or preview.
#[derive(Debug)]
pub struct FileContent {
    /// The file the bytes belong to.
    pub record: FileRecord,
    /// Content type of `bytes`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File service for the quota-aware file lifecycle.
pub struct FileService<'a> {
    db: &'a Database,
    blobs: &'a BlobStore,
    policy: &'a UploadPolicy,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database, blobs: &'a BlobStore, policy: &'a UploadPolicy) -> Self {
        Self { db, blobs, policy }
    }

    fn files(&self) -> FileRepository<'_> {
        FileRepository::new(self.db.pool())
    }

    fn folders(&self) -> FolderRepository<'_> {
        FolderRepository::new(self.db.pool())
    }

    /// Resolve an owned file, soft-deleted or not.
    pub async fn get(&self, user: &User, file_id: i64) -> Result<FileRecord> {
        self.files()
            .get_owned(file_id, user.id)
            .await?
            .ok_or_else(|| EucloudError::NotFound("file".to_string()))
    }

    /// Resolve an optional target folder; None means root.
    async fn require_target(&self, user: &User, folder_id: Option<i64>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            self.folders().require_owned(folder_id, user.id).await?;
        }
        Ok(())
    }

    /// Upload a new file.
    ///
    /// Validation order: extension allowlist, size limit, target folder,
    /// quota. Nothing is written before all of them pass.
    pub async fn upload(
        &self,
        user: &User,
        filename: &str,
        content: &[u8],
        folder_id: Option<i64>,
    ) -> Result<FileRecord> {
        validate_filename(filename, &self.policy.allowed_extensions)?;

        if content.len() as u64 > self.policy.max_upload_bytes {
            return Err(EucloudError::PayloadTooLarge {
                max_bytes: self.policy.max_upload_bytes,
            });
        }

        self.require_target(user, folder_id).await?;

        let file_size = content.len() as i64;
        let current = self.fresh_user(user).await?;
        if !current.has_quota_for(file_size) {
            return Err(EucloudError::QuotaExceeded);
        }

        let mime_type = guess_mime_type(filename);
        let storage_key = FileStorage::generate_key(filename);

        let thumbnail = match mime_type.as_deref() {
            Some(mime) if mime.starts_with("image/") => {
                match thumbnail::generate_async(content.to_vec(), self.policy.thumbnail_max_dimension)
                    .await
                {
                    Ok(bytes) => Some((FileStorage::thumbnail_key(&storage_key), bytes)),
                    Err(e) => {
                        warn!(user_id = user.id, filename, "Thumbnail generation failed: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let new_file = NewFile {
            owner_id: user.id,
            folder_id,
            filename: filename.to_string(),
            storage_key,
            file_size,
            mime_type,
            thumbnail_key: None,
        };

        let result = self.commit_upload(new_file, content, thumbnail).await;
        if let Err(ref e) = result {
            warn!(user_id = user.id, filename, "Upload failed: {}", e);
        }
        result
    }

    async fn commit_upload(
        &self,
        mut new_file: NewFile,
        content: &[u8],
        thumbnail: Option<(String, Vec<u8>)>,
    ) -> Result<FileRecord> {
        let mut tx = self.db.begin().await?;

        // Must be the first statement so the write lock is taken before
        // any read snapshot exists.
        if !UserRepository::reserve_storage(&mut tx, new_file.owner_id, new_file.file_size).await? {
            return Err(EucloudError::QuotaExceeded);
        }
        require_target_in(&mut tx, new_file.owner_id, new_file.folder_id).await?;

        let storage_key = new_file.storage_key.clone();
        let thumbnail_key = thumbnail.as_ref().map(|(key, _)| key.clone());

        let outcome = async move {
            self.blobs
                .originals
                .save_with_key(content, &new_file.storage_key)
                .await?;

            if let Some((key, bytes)) = &thumbnail {
                match self.blobs.thumbnails.save_with_key(bytes, key).await {
                    Ok(()) => new_file.thumbnail_key = Some(key.clone()),
                    Err(e) => warn!("Failed to store thumbnail {}: {}", key, e),
                }
            }

            let record = FileRepository::insert(&mut tx, &new_file).await?;
            ActivityRepository::log(
                &mut tx,
                &NewActivity::file(
                    record.owner_id,
                    record.id,
                    ActivityKind::Upload,
                    format!("Uploaded {}", record.filename),
                ),
            )
            .await?;
            tx.commit().await?;
            Ok::<_, EucloudError>(record)
        }
        .await;

        match outcome {
            Ok(record) => {
                info!(
                    user_id = record.owner_id,
                    file_id = record.id,
                    size = record.file_size,
                    "File uploaded"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard_blobs(&storage_key, thumbnail_key.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Remove blobs written for a transaction that did not commit.
    async fn discard_blobs(&self, storage_key: &str, thumbnail_key: Option<&str>) {
        if let Err(e) = self.blobs.originals.delete(storage_key).await {
            warn!("Failed to remove orphaned blob {}: {}", storage_key, e);
        }
        if let Some(key) = thumbnail_key {
            if let Err(e) = self.blobs.thumbnails.delete(key).await {
                warn!("Failed to remove orphaned thumbnail {}: {}", key, e);
            }
        }
    }

    async fn fresh_user(&self, user: &User) -> Result<User> {
        UserRepository::new(self.db.pool())
            .get_by_id(user.id)
            .await?
            .ok_or_else(|| EucloudError::Unauthorized("Invalid or expired token".to_string()))
    }

    /// List non-deleted files and folders directly in `folder_id` (None = root).
    pub async fn list(&self, user: &User, folder_id: Option<i64>) -> Result<FileListing> {
        self.require_target(user, folder_id).await?;
        let files = self.files().list_by_folder(user.id, folder_id).await?;
        let folders = self.folders().list_by_parent(user.id, folder_id).await?;
        Ok(FileListing { files, folders })
    }

    /// Load a file's bytes and log the download.
    ///
    /// A metadata row whose blob is gone is reported as not found and
    /// logged as an integrity event.
    pub async fn download(&self, user: &User, file_id: i64) -> Result<FileContent> {
        let record = self.get(user, file_id).await?;

        let bytes = match self.blobs.originals.load(&record.storage_key).await {
            Ok(bytes) => bytes,
            Err(EucloudError::NotFound(_)) => return Err(self.missing_blob(&record)),
            Err(e) => return Err(e),
        };

        let mut conn = self.db.pool().acquire().await?;
        ActivityRepository::log(
            &mut conn,
            &NewActivity::file(
                user.id,
                record.id,
                ActivityKind::Download,
                format!("Downloaded {}", record.filename),
            ),
        )
        .await?;

        Ok(FileContent {
            content_type: record.content_type().to_string(),
            bytes,
            record,
        })
    }

    /// Serve the thumbnail if there is one on disk, else the original.
    pub async fn preview(&self, user: &User, file_id: i64) -> Result<FileContent> {
        let record = self.get(user, file_id).await?;

        if let Some(key) = &record.thumbnail_key {
            match self.blobs.thumbnails.load(key).await {
                Ok(bytes) => {
                    return Ok(FileContent {
                        content_type: "image/png".to_string(),
                        bytes,
                        record,
                    })
                }
                Err(EucloudError::NotFound(_)) => {
                    warn!(file_id = record.id, "Thumbnail blob missing, serving original");
                }
                Err(e) => return Err(e),
            }
        }

        match self.blobs.originals.load(&record.storage_key).await {
            Ok(bytes) => Ok(FileContent {
                content_type: record.content_type().to_string(),
                bytes,
                record,
            }),
            Err(EucloudError::NotFound(_)) => Err(self.missing_blob(&record)),
            Err(e) => Err(e),
        }
    }

    fn missing_blob(&self, record: &FileRecord) -> EucloudError {
        error!(
            target: "integrity",
            file_id = record.id,
            storage_key = %record.storage_key,
            "File metadata references a missing blob"
        );
        EucloudError::StorageInconsistency(format!("blob for file {} is missing", record.id))
    }

    /// Change a file's display name. The stored MIME type describes the
    /// bytes, so it is kept.
    pub async fn rename(&self, user: &User, file_id: i64, new_name: &str) -> Result<FileRecord> {
        let record = self.get(user, file_id).await?;
        validate_filename(new_name, &self.policy.allowed_extensions)?;

        let mut tx = self.db.begin().await?;
        FileRepository::update_name(&mut tx, record.id, new_name).await?;
        ActivityRepository::log(
            &mut tx,
            &NewActivity::file(
                user.id,
                record.id,
                ActivityKind::Rename,
                format!("Renamed {} to {}", record.filename, new_name),
            ),
        )
        .await?;
        let updated = reload(&mut tx, record.id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Move a file to another folder (None = root).
    pub async fn move_to(
        &self,
        user: &User,
        file_id: i64,
        folder_id: Option<i64>,
    ) -> Result<FileRecord> {
        let record = self.get(user, file_id).await?;
        self.require_target(user, folder_id).await?;

        let mut tx = self.db.begin().await?;
        require_target_in(&mut tx, user.id, folder_id).await?;
        FileRepository::update_folder(&mut tx, record.id, folder_id).await?;
        ActivityRepository::log(
            &mut tx,
            &NewActivity::file(
                user.id,
                record.id,
                ActivityKind::Move,
                format!("Moved {}", record.filename),
            ),
        )
        .await?;
        let updated = reload(&mut tx, record.id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Duplicate a file's bytes under a new key, charging the quota.
    ///
    /// The copy starts without a thumbnail.
    pub async fn copy(
        &self,
        user: &User,
        file_id: i64,
        folder_id: Option<i64>,
    ) -> Result<FileRecord> {
        let source = self.get(user, file_id).await?;
        self.require_target(user, folder_id).await?;

        let current = self.fresh_user(user).await?;
        if !current.has_quota_for(source.file_size) {
            return Err(EucloudError::QuotaExceeded);
        }

        if !self.blobs.originals.exists(&source.storage_key).await {
            return Err(self.missing_blob(&source));
        }

        let new_file = NewFile {
            owner_id: user.id,
            folder_id,
            filename: format!("{COPY_PREFIX}{}", source.filename),
            storage_key: FileStorage::generate_key(&source.filename),
            file_size: source.file_size,
            mime_type: source.mime_type.clone(),
            thumbnail_key: None,
        };

        let mut tx = self.db.begin().await?;
        if !UserRepository::reserve_storage(&mut tx, user.id, new_file.file_size).await? {
            return Err(EucloudError::QuotaExceeded);
        }
        require_target_in(&mut tx, user.id, new_file.folder_id).await?;

        let storage_key = new_file.storage_key.clone();
        let source_id = source.id;
        let outcome = async move {
            self.blobs
                .originals
                .copy(&source.storage_key, &new_file.storage_key)
                .await?;
            let record = FileRepository::insert(&mut tx, &new_file).await?;
            ActivityRepository::log(
                &mut tx,
                &NewActivity::file(
                    user.id,
                    record.id,
                    ActivityKind::Copy,
                    format!("Copied {}", source.filename),
                ),
            )
            .await?;
            tx.commit().await?;
            Ok::<_, EucloudError>(record)
        }
        .await;

        match outcome {
            Ok(record) => {
                info!(user_id = user.id, file_id = record.id, source_id, "File copied");
                Ok(record)
            }
            Err(e) => {
                self.discard_blobs(&storage_key, None).await;
                Err(e)
            }
        }
    }

    /// Move a file to the trash. Quota and blob are left untouched.
    ///
    /// Deleting an already-deleted file succeeds without logging again.
    pub async fn soft_delete(&self, user: &User, file_id: i64) -> Result<FileRecord> {
        let record = self.get(user, file_id).await?;

        let mut tx = self.db.begin().await?;
        if FileRepository::soft_delete(&mut tx, record.id).await? {
            ActivityRepository::log(
                &mut tx,
                &NewActivity::file(
                    user.id,
                    record.id,
                    ActivityKind::Delete,
                    format!("Deleted {}", record.filename),
                ),
            )
            .await?;
        }
        let updated = reload(&mut tx, record.id).await?;
        tx.commit().await?;

        Ok(updated)
    }
}

/// Re-check an owned folder on an open transaction; None means root.
///
/// The check is a write, so it also takes the database write lock and the
/// folder cannot be deleted or re-parented before the transaction ends.
async fn require_target_in(
    conn: &mut SqliteConnection,
    owner_id: i64,
    folder_id: Option<i64>,
) -> Result<()> {
    if let Some(folder_id) = folder_id {
        if !FolderRepository::lock(conn, folder_id, owner_id).await? {
            return Err(EucloudError::NotFound("folder".to_string()));
        }
    }
    Ok(())
}

async fn reload(conn: &mut SqliteConnection, file_id: i64) -> Result<FileRecord> {
    FileRepository::get_in(conn, file_id)
        .await?
        .ok_or_else(|| EucloudError::NotFound("file".to_string()))
}

/// Folder service for the per-owner folder tree.
pub struct FolderService<'a> {
    db: &'a Database,
}

impl<'a> FolderService<'a> {
    /// Create a new FolderService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn repo(&self) -> FolderRepository<'_> {
        FolderRepository::new(self.db.pool())
    }

    /// Create a folder under `parent_id` (None = root).
    pub async fn create(&self, user: &User, name: &str, parent_id: Option<i64>) -> Result<Folder> {
        let name = name.trim();
        validate_folder_name(name)?;
        if let Some(parent_id) = parent_id {
            self.repo().require_owned(parent_id, user.id).await?;
        }

        let mut tx = self.db.begin().await?;
        require_target_in(&mut tx, user.id, parent_id).await?;
        let folder = FolderRepository::create(
            &mut tx,
            &NewFolder::new(user.id, name).with_parent(parent_id),
        )
        .await?;
        ActivityRepository::log(
            &mut tx,
            &NewActivity::folder(
                user.id,
                folder.id,
                ActivityKind::CreateFolder,
                format!("Created folder {}", folder.name),
            ),
        )
        .await?;
        tx.commit().await?;

        info!(user_id = user.id, folder_id = folder.id, "Folder created");
        Ok(folder)
    }

    /// Every folder the user owns.
    pub async fn list(&self, user: &User) -> Result<Vec<Folder>> {
        self.repo().list_all(user.id).await
    }

    /// Resolve an owned folder.
    pub async fn get(&self, user: &User, folder_id: i64) -> Result<Folder> {
        self.repo().require_owned(folder_id, user.id).await
    }

    /// Breadcrumbs from the root down to (and including) an owned folder.
    pub async fn path(&self, user: &User, folder_id: i64) -> Result<Vec<Folder>> {
        let folder = self.get(user, folder_id).await?;
        self.repo().get_path(folder.id, user.id).await
    }

    /// Rename a folder.
    pub async fn rename(&self, user: &User, folder_id: i64, name: &str) -> Result<Folder> {
        let folder = self.get(user, folder_id).await?;
        let name = name.trim();
        validate_folder_name(name)?;

        let mut tx = self.db.begin().await?;
        FolderRepository::rename(&mut tx, folder.id, name).await?;
        ActivityRepository::log(
            &mut tx,
            &NewActivity::folder(
                user.id,
                folder.id,
                ActivityKind::Rename,
                format!("Renamed folder {} to {}", folder.name, name),
            ),
        )
        .await?;
        tx.commit().await?;

        Ok(Folder {
            name: name.to_string(),
            ..folder
        })
    }

    /// Re-parent a folder. Moving a folder into itself or one of its
    /// descendants is rejected.
    pub async fn move_to(
        &self,
        user: &User,
        folder_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Folder> {
        let folder = self.get(user, folder_id).await?;
        if let Some(parent_id) = parent_id {
            self.repo().require_owned(parent_id, user.id).await?;
        }

        let mut tx = self.db.begin().await?;
        require_target_in(&mut tx, user.id, Some(folder.id)).await?;
        require_target_in(&mut tx, user.id, parent_id).await?;
        // The ancestry walk must see every move committed before ours.
        if let Some(parent_id) = parent_id {
            if FolderRepository::is_within(&mut tx, parent_id, folder.id, user.id).await? {
                return Err(EucloudError::Validation(
                    "Cannot move a folder into itself or one of its subfolders".to_string(),
                ));
            }
        }
        FolderRepository::set_parent(&mut tx, folder.id, parent_id).await?;
        ActivityRepository::log(
            &mut tx,
            &NewActivity::folder(
                user.id,
                folder.id,
                ActivityKind::Move,
                format!("Moved folder {}", folder.name),
            ),
        )
        .await?;
        tx.commit().await?;

        Ok(Folder { parent_id, ..folder })
    }

    /// Delete an empty folder.
    ///
    /// Trashed files still pointing at it fall back to root.
    pub async fn delete(&self, user: &User, folder_id: i64) -> Result<()> {
        let folder = self.get(user, folder_id).await?;

        let mut tx = self.db.begin().await?;
        require_target_in(&mut tx, user.id, Some(folder.id)).await?;
        if FolderRepository::has_children(&mut tx, folder.id).await? {
            return Err(EucloudError::Validation("Folder is not empty".to_string()));
        }
        ActivityRepository::log(
            &mut tx,
            &NewActivity::folder(
                user.id,
                folder.id,
                ActivityKind::Delete,
                format!("Deleted folder {}", folder.name),
            ),
        )
        .await?;
        FolderRepository::delete(&mut tx, folder.id).await?;
        tx.commit().await?;

        info!(user_id = user.id, folder_id = folder.id, "Folder deleted");
        Ok(())
    }
}

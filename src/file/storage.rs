//! Blob storage for EUCLOUD.
//!
//! This module provides the on-disk byte store:
//! - UUID-based storage keys, never derived from display names
//! - Directory sharding by the first 2 characters of the UUID
//! - Separate roots for originals and thumbnails

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{EucloudError, Result};

/// Prefix of thumbnail storage keys.
pub const THUMBNAIL_PREFIX: &str = "thumb_";

/// File storage for one blob root.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── thumb_cd90ab12-3456-7890-abcd-ef1234567890.png
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write content under `key`, creating the shard directory.
    pub async fn save_with_key(&self, content: &[u8], key: &str) -> Result<()> {
        let file_path = self.get_file_path(key)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, content).await?;
        Ok(())
    }

    /// Load the content stored under `key`.
    pub async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let file_path = self.get_file_path(key)?;

        match fs::read(&file_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(EucloudError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it didn't exist.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let file_path = self.get_file_path(key)?;

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.get_file_path(key) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Copy a blob to a new key within this store.
    pub async fn copy(&self, from_key: &str, to_key: &str) -> Result<u64> {
        let source = self.get_file_path(from_key)?;
        let target = self.get_file_path(to_key)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::copy(&source, &target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(EucloudError::NotFound(format!("blob {from_key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the full path for a key: `{base_path}/{shard}/{key}`.
    ///
    /// Keys that could escape the base directory are rejected.
    pub fn get_file_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_valid_key(key) {
            return Err(EucloudError::Validation(format!("invalid storage key: {key}")));
        }
        Ok(self.base_path.join(Self::get_shard(key)).join(key))
    }

    /// Keys are generated here, so anything but `[A-Za-z0-9._-]` without
    /// `..` is foreign.
    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && !key.contains("..")
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }

    /// Shard directory: first 2 characters of the UUID part of the key.
    fn get_shard(key: &str) -> &str {
        let uuid_part = key.strip_prefix(THUMBNAIL_PREFIX).unwrap_or(key);
        if uuid_part.len() >= 2 {
            &uuid_part[..2]
        } else {
            uuid_part
        }
    }

    /// Extract the lower-cased extension of a filename, or "bin".
    fn extract_extension(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Generate a fresh storage key for a file with the given display name.
    pub fn generate_key(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }

    /// Derive the thumbnail key for an original's storage key.
    pub fn thumbnail_key(storage_key: &str) -> String {
        let stem = Path::new(storage_key)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(storage_key);
        format!("{THUMBNAIL_PREFIX}{stem}.png")
    }
}

/// The two blob roots: originals and derived thumbnails.
#[derive(Debug, Clone)]
pub struct BlobStore {
    pub originals: FileStorage,
    pub thumbnails: FileStorage,
}

impl BlobStore {
    /// Open (and create) both roots.
    pub fn new(upload_path: impl Into<PathBuf>, thumbnail_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            originals: FileStorage::new(upload_path)?,
            thumbnails: FileStorage::new(thumbnail_path)?,
        })
    }
}

//! File management module for EUCLOUD.
//!
//! This module provides the file lifecycle including:
//! - Per-owner folder tree
//! - File metadata with soft-delete
//! - Blob storage with UUID naming and image thumbnails
//! - Quota-aware upload and copy

mod folder;
mod metadata;
mod service;
mod storage;
pub mod thumbnail;
mod usage;

pub use folder::{Folder, FolderRepository, NewFolder};
pub use metadata::{FileRecord, FileRepository, NewFile};
pub use service::{FileContent, FileListing, FileService, FolderService, UploadPolicy};
pub use storage::{BlobStore, FileStorage, THUMBNAIL_PREFIX};
pub use usage::{StorageUsage, UsageService, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};

use crate::{EucloudError, Result};

/// Maximum length for file and folder names (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum folder depth (levels).
pub const MAX_FOLDER_DEPTH: usize = 64;

/// Prefix added to the display name of a copied file.
pub const COPY_PREFIX: &str = "Copy of ";

/// Check the shape of a file or folder name.
fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EucloudError::Validation(format!("{what} name is required")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(EucloudError::Validation(format!(
            "{what} name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(EucloudError::Validation(format!("invalid {what} name")));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(EucloudError::Validation(format!(
            "{what} name contains invalid characters"
        )));
    }
    Ok(())
}

/// Validate a display filename against the extension allowlist.
///
/// The extension is the text after the last dot, compared
/// case-insensitively.
pub fn validate_filename(name: &str, allowed_extensions: &[String]) -> Result<()> {
    validate_name(name, "file")?;

    let allowed = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .is_some_and(|ext| allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)));

    if !allowed {
        return Err(EucloudError::Validation("File type not allowed".to_string()));
    }
    Ok(())
}

/// Validate a folder name.
pub fn validate_folder_name(name: &str) -> Result<()> {
    validate_name(name, "folder")
}

/// Best-effort MIME type from a display name.
pub fn guess_mime_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Strip any client-supplied directory components from an upload name.
pub fn upload_display_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        ["txt", "png", "jpg", "pdf"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_filename_allowlist() {
        assert!(validate_filename("notes.txt", &allowed()).is_ok());
        assert!(validate_filename("Photo.JPG", &allowed()).is_ok());
        assert!(validate_filename("archive.tar.pdf", &allowed()).is_ok());
        assert!(validate_filename("script.exe", &allowed()).is_err());
        assert!(validate_filename("noextension", &allowed()).is_err());
        assert!(validate_filename("trailingdot.", &allowed()).is_err());
    }

    #[test]
    fn test_validate_filename_shape() {
        assert!(validate_filename("", &allowed()).is_err());
        assert!(validate_filename("   ", &allowed()).is_err());
        assert!(validate_filename("../etc.txt", &allowed()).is_err());
        assert!(validate_filename("a\\b.txt", &allowed()).is_err());
        assert!(validate_filename("bad\u{0}.txt", &allowed()).is_err());
        let long = format!("{}.txt", "a".repeat(MAX_NAME_LENGTH));
        assert!(validate_filename(&long, &allowed()).is_err());
    }

    #[test]
    fn test_validate_folder_name() {
        assert!(validate_folder_name("Documents").is_ok());
        assert!(validate_folder_name("My Photos 2024").is_ok());
        assert!(validate_folder_name("").is_err());
        assert!(validate_folder_name("a/b").is_err());
        assert!(validate_folder_name("..").is_err());
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.png").as_deref(), Some("image/png"));
        assert_eq!(guess_mime_type("a.txt").as_deref(), Some("text/plain"));
        assert_eq!(guess_mime_type("a.unknownext"), None);
    }

    #[test]
    fn test_upload_display_name() {
        assert_eq!(upload_display_name("report.pdf"), "report.pdf");
        assert_eq!(upload_display_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(upload_display_name("dir/sub/report.pdf"), "report.pdf");
    }
}

//! Request DTOs for the HTTP API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::{display_name, email_address};

// ============================================================================
// Auth
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Email address (used as the login identifier).
    #[validate(custom(function = "email_address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
}

/// Login request.
///
/// Clients may send the identifier as `identifier`, `email` or `username`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address.
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1, message = "Email is required"))]
    pub identifier: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================================================
// Files
// ============================================================================

/// Query for listing a folder's contents.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Folder to list (omit for the root).
    pub folder_id: Option<i64>,
}

/// Rename a file.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameFileRequest {
    /// New display name, extension included.
    #[serde(alias = "new_name")]
    #[validate(
        length(min = 1, max = 255, message = "Filename must be 1-255 characters"),
        custom(function = "display_name")
    )]
    pub filename: String,
}

/// Move or copy target. A missing or null folder means the root.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TargetFolderRequest {
    /// Destination folder.
    #[serde(default, alias = "target_folder_id", alias = "parent_id")]
    pub folder_id: Option<i64>,
}

// ============================================================================
// Folders
// ============================================================================

/// Create a folder.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "display_name")
    )]
    pub name: String,
    /// Parent folder (omit for the root).
    #[serde(default, alias = "parent_folder_id")]
    pub parent_id: Option<i64>,
}

/// Rename a folder.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenameFolderRequest {
    /// New folder name.
    #[serde(alias = "new_name")]
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "display_name")
    )]
    pub name: String,
}

// ============================================================================
// Storage
// ============================================================================

/// Activity feed query.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Maximum entries to return (default 50, at most 200).
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_login_request_aliases() {
        for body in [
            r#"{"identifier":"a@b.com","password":"x"}"#,
            r#"{"email":"a@b.com","password":"x"}"#,
            r#"{"username":"a@b.com","password":"x"}"#,
        ] {
            let req: LoginRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.identifier, "a@b.com");
        }
    }

    #[test]
    fn test_rename_request_alias_and_validation() {
        let req: RenameFileRequest = serde_json::from_str(r#"{"new_name":"b.txt"}"#).unwrap();
        assert_eq!(req.filename, "b.txt");
        assert!(req.validate().is_ok());

        let blank = RenameFileRequest {
            filename: "   ".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_target_folder_defaults_to_root() {
        let req: TargetFolderRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.folder_id, None);

        let req: TargetFolderRequest =
            serde_json::from_str(r#"{"target_folder_id":7}"#).unwrap();
        assert_eq!(req.folder_id, Some(7));
    }
}

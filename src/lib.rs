//! EUCLOUD - personal cloud file storage.
//!
//! Accounts with a storage quota, a per-user folder tree, file upload and
//! download with image thumbnails, and a session token shared with sibling
//! applications through an SSO cookie.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{hash_password, verify_password, AuthService, TokenIssuer};
pub use config::Config;
pub use db::{Database, User};
pub use error::{EucloudError, Result};
pub use file::{FileService, FolderService, UsageService};
pub use web::WebServer;

//! API handlers.

pub mod auth;
pub mod file;
pub mod folder;
pub mod storage;

pub use auth::*;
pub use file::*;
pub use folder::*;
pub use storage::*;

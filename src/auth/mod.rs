//! Authentication module for EUCLOUD.
//!
//! This module provides password hashing, session tokens, the SSO
//! cookie and the registration/login service.

mod cookie;
mod password;
mod service;
mod token;
pub mod validation;

pub use cookie::SessionCookie;
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use service::{AuthService, AuthSession, INVALID_CREDENTIALS};
pub use token::{SessionClaims, TokenIssuer, DEFAULT_TOKEN_EXPIRY_SECS};
pub use validation::ValidationError;

//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so verification reads the cost
//! parameters back from the stored hash rather than from the constants below.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand_core::OsRng;
use thiserror::Error;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 72;

// Every login pays this cost, so it is tuned for a request path rather than
// for offline storage.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,

    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    TooLong,

    /// The hasher itself failed (bad parameters, RNG failure).
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The stored value is not a PHC hash string.
    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("password does not match")]
    Mismatch,
}

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Check the length policy and hash `password` with a fresh salt.
///
/// ```
/// let hash = eucloud::hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify `password` against a stored PHC hash.
///
/// ```
/// let hash = eucloud::hash_password("correct horse").unwrap();
/// assert!(eucloud::verify_password("correct horse", &hash).is_ok());
/// assert!(eucloud::verify_password("battery staple", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// Length policy, counted in characters rather than bytes.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    match password.chars().count() {
        n if n < MIN_PASSWORD_LENGTH => Err(PasswordError::TooShort),
        n if n > MAX_PASSWORD_LENGTH => Err(PasswordError::TooLong),
        _ => Ok(()),
    }
}

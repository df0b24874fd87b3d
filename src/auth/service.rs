//! Authentication service for EUCLOUD.
//!
//! Registration, login and token resolution. Logout has no server-side
//! state to touch; the web layer only clears the session cookie.

use tracing::{debug, info};

use super::password::{hash_password, validate_password, verify_password, PasswordError};
use super::token::TokenIssuer;
use super::validation::{normalize_email, validate_email};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{EucloudError, Result};

/// Message returned for every failed login, whichever credential was wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Service for authentication operations.
pub struct AuthService<'a> {
    db: &'a Database,
    tokens: &'a TokenIssuer,
    default_quota: i64,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService.
    pub fn new(db: &'a Database, tokens: &'a TokenIssuer, default_quota: i64) -> Self {
        Self {
            db,
            tokens,
            default_quota,
        }
    }

    /// Register a new account and issue a token for it.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        validate_email(&email).map_err(|e| EucloudError::Validation(e.to_string()))?;
        validate_password(password).map_err(|e| EucloudError::Validation(e.to_string()))?;

        let repo = UserRepository::new(self.db.pool());
        if repo.email_exists(&email).await? {
            return Err(EucloudError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let user = repo
            .create(&NewUser::new(email, password_hash, self.default_quota))
            .await?;

        info!(user_id = user.id, "User registered");
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Log in with an email (which doubles as the username) and password.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(identifier);
        if email.is_empty() || password.is_empty() {
            return Err(EucloudError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = UserRepository::new(self.db.pool())
            .get_by_email(&email)
            .await?
            .ok_or_else(|| EucloudError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        verify_blocking(password.to_string(), user.password_hash.clone())
            .await
            .map_err(|_| {
                debug!(user_id = user.id, "Password verification failed");
                EucloudError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        info!(user_id = user.id, "User logged in");
        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Resolve a session token to its user.
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let user_id = self
            .tokens
            .verify(token)
            .map_err(|_| EucloudError::Unauthorized("Invalid or expired token".to_string()))?;

        UserRepository::new(self.db.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| EucloudError::Unauthorized("Invalid or expired token".to_string()))
    }
}

/// Argon2 is CPU-bound; keep it off the async worker threads.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| EucloudError::Io(std::io::Error::other(e.to_string())))?
        .map_err(|e| match e {
            PasswordError::TooShort | PasswordError::TooLong => {
                EucloudError::Validation(e.to_string())
            }
            other => EucloudError::Io(std::io::Error::other(other.to_string())),
        })
}

async fn verify_blocking(password: String, hash: String) -> Result<()> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| EucloudError::Io(std::io::Error::other(e.to_string())))?
        .map_err(|_| EucloudError::Unauthorized(INVALID_CREDENTIALS.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: i64 = 1024;

    async fn setup() -> (Database, TokenIssuer) {
        let db = Database::open_in_memory().await.unwrap();
        (db, TokenIssuer::new("test-secret", 3600))
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (db, tokens) = setup().await;
        let service = AuthService::new(&db, &tokens, QUOTA);

        let registered = service
            .register("Alice@Example.com", "password123")
            .await
            .unwrap();
        assert_eq!(registered.user.email, "alice@example.com");
        assert_eq!(registered.user.storage_quota, QUOTA);
        assert_eq!(tokens.verify(&registered.token).unwrap(), registered.user.id);

        let session = service
            .login("ALICE@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let (db, tokens) = setup().await;
        let service = AuthService::new(&db, &tokens, QUOTA);

        service.register("bob@example.com", "password123").await.unwrap();
        let result = service.register("BOB@example.com", "different456").await;
        assert!(matches!(result, Err(EucloudError::Conflict(_))));

        // The first account keeps its password.
        assert!(service.login("bob@example.com", "password123").await.is_ok());
        assert!(service.login("bob@example.com", "different456").await.is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let (db, tokens) = setup().await;
        let service = AuthService::new(&db, &tokens, QUOTA);

        assert!(matches!(
            service.register("not-an-email", "password123").await,
            Err(EucloudError::Validation(_))
        ));
        assert!(matches!(
            service.register("c@example.com", "short").await,
            Err(EucloudError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let (db, tokens) = setup().await;
        let service = AuthService::new(&db, &tokens, QUOTA);
        service.register("dave@example.com", "password123").await.unwrap();

        let wrong_password = service.login("dave@example.com", "wrongpass1").await;
        let unknown_user = service.login("nobody@example.com", "password123").await;

        let (Err(EucloudError::Unauthorized(a)), Err(EucloudError::Unauthorized(b))) =
            (wrong_password, unknown_user)
        else {
            panic!("expected Unauthorized for both");
        };
        assert_eq!(a, b);
        assert_eq!(a, INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_current_user() {
        let (db, tokens) = setup().await;
        let service = AuthService::new(&db, &tokens, QUOTA);
        let session = service.register("erin@example.com", "password123").await.unwrap();

        let user = service.current_user(&session.token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        assert!(matches!(
            service.current_user("garbage").await,
            Err(EucloudError::Unauthorized(_))
        ));

        // Valid signature for a user that does not exist.
        let orphan = tokens.issue(9999).unwrap();
        assert!(matches!(
            service.current_user(&orphan).await,
            Err(EucloudError::Unauthorized(_))
        ));
    }
}

//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the numeric user ID and an absolute
//! expiry. Nothing is stored server-side.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{EucloudError, Result};

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// JWT claims.
///
/// `user_id` is kept numeric instead of using the string-typed `sub` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID.
    pub user_id: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl TokenIssuer {
    /// Create an issuer from a signing secret and token lifetime.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by verify_at so that "now == exp" is rejected
        // and no leeway applies.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Issue a token for `user_id` valid from now.
    pub fn issue(&self, user_id: i64) -> Result<String> {
        self.issue_at(user_id, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: i64, now: i64) -> Result<String> {
        let claims = SessionClaims {
            user_id,
            iat: now,
            exp: now.saturating_add(self.expiry_secs as i64),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            EucloudError::InvalidToken
        })
    }

    /// Verify a token and return the user ID it carries.
    pub fn verify(&self, token: &str) -> Result<i64> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token against the given current time.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<i64> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                EucloudError::InvalidToken
            })?;

        if now >= data.claims.exp {
            return Err(EucloudError::InvalidToken);
        }
        Ok(data.claims.user_id)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expiry_secs", &self.expiry_secs)
            .finish_non_exhaustive()
    }
}

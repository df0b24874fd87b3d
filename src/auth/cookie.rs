//! SSO session cookie.
//!
//! The session token is mirrored into an HttpOnly cookie so sibling
//! applications on the same domain share the login.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::AuthConfig;

/// Settings for the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Shared domain, if any.
    pub domain: Option<String>,
    /// Cookie path.
    pub path: String,
    /// Send only over HTTPS.
    pub secure: bool,
    /// Max-age in seconds; matches the token lifetime.
    pub max_age_secs: u64,
}

impl SessionCookie {
    /// Build the cookie settings from the auth config.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            domain: config.cookie_domain.clone().filter(|d| !d.is_empty()),
            path: config.cookie_path.clone(),
            secure: config.cookie_secure,
            max_age_secs: config.token_expiry_secs,
        }
    }

    /// Cookie carrying `token`.
    pub fn build(&self, token: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), token.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path(self.path.clone())
            .max_age(Duration::seconds(self.max_age_secs as i64));
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }

    /// Cookie that removes the session cookie.
    ///
    /// Path and domain must equal the ones used when setting it or
    /// browsers keep the original.
    pub fn removal(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), String::new()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path(self.path.clone())
            .max_age(Duration::ZERO);
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(domain: Option<&str>) -> SessionCookie {
        SessionCookie {
            name: "eusuite_token".to_string(),
            domain: domain.map(str::to_string),
            path: "/".to_string(),
            secure: false,
            max_age_secs: 86400,
        }
    }

    #[test]
    fn test_build_cookie_attributes() {
        let cookie = settings(Some(".example.com")).build("abc");
        assert_eq!(cookie.name(), "eusuite_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86400)));
    }

    #[test]
    fn test_removal_matches_scope() {
        let settings = settings(Some("example.com"));
        let set = settings.build("abc");
        let removal = settings.removal();

        assert_eq!(removal.name(), set.name());
        assert_eq!(removal.path(), set.path());
        assert_eq!(removal.domain(), set.domain());
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_no_domain() {
        let cookie = settings(None).build("abc");
        assert_eq!(cookie.domain(), None);
    }

    #[test]
    fn test_from_config_ignores_empty_domain() {
        let config = AuthConfig {
            cookie_domain: Some(String::new()),
            ..AuthConfig::default()
        };
        assert!(SessionCookie::from_config(&config).domain.is_none());
    }
}

//! Configuration module for EUCLOUD.

use serde::Deserialize;
use std::path::Path;

use crate::{EucloudError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/eucloud.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage and upload policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded originals.
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    /// Directory for generated thumbnails.
    #[serde(default = "default_thumbnail_path")]
    pub thumbnail_path: String,
    /// Maximum single upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Allowed file extensions (lowercase, without the dot).
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Quota assigned to newly registered users, in bytes.
    #[serde(default = "default_quota_bytes")]
    pub default_quota_bytes: i64,
    /// Bounding box for generated thumbnails, in pixels.
    #[serde(default = "default_thumbnail_max_dimension")]
    pub thumbnail_max_dimension: u32,
}

fn default_upload_path() -> String {
    "data/uploads".to_string()
}

fn default_thumbnail_path() -> String {
    "data/thumbnails".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

fn default_allowed_extensions() -> Vec<String> {
    [
        "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        "zip", "rar", "mp4", "mp3", "wav", "avi", "mov", "json", "md", "py", "js", "html", "css",
        "ty",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_quota_bytes() -> i64 {
    5 * 1024 * 1024 * 1024 // 5GB
}

fn default_thumbnail_max_dimension() -> u32 {
    200
}

impl StorageConfig {
    /// Maximum single upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_path: default_upload_path(),
            thumbnail_path: default_thumbnail_path(),
            max_upload_size_mb: default_max_upload_size(),
            allowed_extensions: default_allowed_extensions(),
            default_quota_bytes: default_quota_bytes(),
            thumbnail_max_dimension: default_thumbnail_max_dimension(),
        }
    }
}

/// Authentication and SSO cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
    /// Whether the session token is mirrored into an HttpOnly cookie.
    #[serde(default = "default_sso_cookie")]
    pub sso_cookie: bool,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Shared domain the cookie is scoped to (None = host-only).
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Cookie path.
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Whether the cookie carries the Secure attribute.
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_token_expiry() -> u64 {
    86400 // 24 hours
}

fn default_sso_cookie() -> bool {
    true
}

fn default_cookie_name() -> String {
    "eusuite_token".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
            sso_cookie: default_sso_cookie(),
            cookie_name: default_cookie_name(),
            cookie_domain: None,
            cookie_path: default_cookie_path(),
            cookie_secure: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/eucloud.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(EucloudError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EucloudError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `EUCLOUD_JWT_SECRET`
    /// - `EUCLOUD_TOKEN_EXPIRY_SECS`
    /// - `EUCLOUD_COOKIE_DOMAIN`
    /// - `EUCLOUD_DATABASE_PATH`
    /// - `EUCLOUD_UPLOAD_PATH`
    /// - `EUCLOUD_THUMBNAIL_PATH`
    /// - `EUCLOUD_MAX_UPLOAD_MB`
    /// - `EUCLOUD_DEFAULT_QUOTA` (bytes)
    /// - `EUCLOUD_ALLOWED_EXTENSIONS` (comma-separated)
    ///
    /// Empty or unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = env_string("EUCLOUD_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(expiry) = env_parsed("EUCLOUD_TOKEN_EXPIRY_SECS") {
            self.auth.token_expiry_secs = expiry;
        }
        if let Some(domain) = env_string("EUCLOUD_COOKIE_DOMAIN") {
            self.auth.cookie_domain = Some(domain);
        }
        if let Some(path) = env_string("EUCLOUD_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(path) = env_string("EUCLOUD_UPLOAD_PATH") {
            self.storage.upload_path = path;
        }
        if let Some(path) = env_string("EUCLOUD_THUMBNAIL_PATH") {
            self.storage.thumbnail_path = path;
        }
        if let Some(mb) = env_parsed("EUCLOUD_MAX_UPLOAD_MB") {
            self.storage.max_upload_size_mb = mb;
        }
        if let Some(quota) = env_parsed("EUCLOUD_DEFAULT_QUOTA") {
            self.storage.default_quota_bytes = quota;
        }
        if let Some(list) = env_string("EUCLOUD_ALLOWED_EXTENSIONS") {
            let extensions: Vec<String> = list
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !extensions.is_empty() {
                self.storage.allowed_extensions = extensions;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(EucloudError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via EUCLOUD_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.auth.token_expiry_secs == 0 {
            return Err(EucloudError::Config(
                "token_expiry_secs must be greater than zero".to_string(),
            ));
        }
        if self.storage.default_quota_bytes <= 0 {
            return Err(EucloudError::Config(
                "default_quota_bytes must be greater than zero".to_string(),
            ));
        }
        if self.storage.allowed_extensions.is_empty() {
            return Err(EucloudError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_upload_size_saturates() {
        let storage = StorageConfig {
            max_upload_size_mb: u64::MAX,
            ..StorageConfig::default()
        };
        assert_eq!(storage.max_upload_size_bytes(), u64::MAX);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.path, "data/eucloud.db");

        assert_eq!(config.storage.upload_path, "data/uploads");
        assert_eq!(config.storage.thumbnail_path, "data/thumbnails");
        assert_eq!(config.storage.max_upload_size_mb, 100);
        assert_eq!(config.storage.max_upload_size_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.storage.default_quota_bytes, 5 * 1024 * 1024 * 1024);
        assert_eq!(config.storage.thumbnail_max_dimension, 200);
        assert!(config.storage.allowed_extensions.contains(&"png".to_string()));
        assert!(config.storage.allowed_extensions.contains(&"ty".to_string()));
        assert!(!config.storage.allowed_extensions.contains(&"exe".to_string()));

        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.token_expiry_secs, 86400);
        assert!(config.auth.sso_cookie);
        assert_eq!(config.auth.cookie_name, "eusuite_token");
        assert!(config.auth.cookie_domain.is_none());
        assert_eq!(config.auth.cookie_path, "/");
        assert!(!config.auth.cookie_secure);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/eucloud.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:5173"]

[database]
path = "custom/db.sqlite"

[storage]
upload_path = "custom/uploads"
thumbnail_path = "custom/thumbs"
max_upload_size_mb = 20
allowed_extensions = ["txt", "png"]
default_quota_bytes = 1048576
thumbnail_max_dimension = 128

[auth]
jwt_secret = "test-secret-key"
token_expiry_secs = 3600
sso_cookie = false
cookie_name = "sso"
cookie_domain = ".example.com"
cookie_path = "/"
cookie_secure = true

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);

        assert_eq!(config.database.path, "custom/db.sqlite");

        assert_eq!(config.storage.upload_path, "custom/uploads");
        assert_eq!(config.storage.thumbnail_path, "custom/thumbs");
        assert_eq!(config.storage.max_upload_size_mb, 20);
        assert_eq!(config.storage.allowed_extensions, vec!["txt", "png"]);
        assert_eq!(config.storage.default_quota_bytes, 1048576);
        assert_eq!(config.storage.thumbnail_max_dimension, 128);

        assert_eq!(config.auth.jwt_secret, "test-secret-key");
        assert_eq!(config.auth.token_expiry_secs, 3600);
        assert!(!config.auth.sso_cookie);
        assert_eq!(config.auth.cookie_name, "sso");
        assert_eq!(config.auth.cookie_domain.as_deref(), Some(".example.com"));
        assert!(config.auth.cookie_secure);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000

[auth]
jwt_secret = "partial"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.jwt_secret, "partial");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.token_expiry_secs, 86400);
        assert_eq!(config.database.path, "data/eucloud.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.max_upload_size_mb, 100);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(EucloudError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(EucloudError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let keys = [
            "EUCLOUD_JWT_SECRET",
            "EUCLOUD_DEFAULT_QUOTA",
            "EUCLOUD_ALLOWED_EXTENSIONS",
            "EUCLOUD_MAX_UPLOAD_MB",
        ];
        let originals: Vec<Option<String>> = keys.iter().map(|k| std::env::var(k).ok()).collect();

        std::env::set_var("EUCLOUD_JWT_SECRET", "env-secret-key");
        std::env::set_var("EUCLOUD_DEFAULT_QUOTA", "100");
        std::env::set_var("EUCLOUD_ALLOWED_EXTENSIONS", "TXT, .md,,png");
        std::env::set_var("EUCLOUD_MAX_UPLOAD_MB", "not-a-number");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.auth.jwt_secret, "env-secret-key");
        assert_eq!(config.storage.default_quota_bytes, 100);
        assert_eq!(config.storage.allowed_extensions, vec!["txt", "md", "png"]);
        // Unparsable value keeps the default
        assert_eq!(config.storage.max_upload_size_mb, 100);

        for (key, original) in keys.iter().zip(originals) {
            match original {
                Some(val) => std::env::set_var(key, val),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        let result = config.validate();
        assert!(matches!(result, Err(EucloudError::Config(msg)) if msg.contains("jwt_secret")));
    }

    #[test]
    fn test_validate_rejects_zero_expiry() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.auth.token_expiry_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_allowlist() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.storage.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }
}

//! Configuration management
//!
//! This module handles loading and parsing configuration for the HAY Property backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session token configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Outgoing mail configuration
    #[serde(default)]
    pub mail: MailConfig,
    /// Bootstrap administrator
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Public URL of the website, used to build links in emails
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/hay.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens; there is no built-in value
    #[serde(default)]
    pub jwt_secret: String,
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Add the `Secure` attribute to session cookies
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_days: default_session_days(),
            secure_cookies: false,
        }
    }
}

/// Shortest accepted session signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Sample values that must never sign real sessions
const PLACEHOLDER_JWT_SECRETS: &[&str] = &["change-me-in-production", "changeme", "secret"];

fn default_session_days() -> i64 {
    7
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    600
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "image/svg+xml".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            "image/x-icon" => "ico",
            _ => "bin",
        }
    }
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Local filesystem (default)
    #[default]
    Local,
    /// S3-compatible object storage
    S3,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (local or s3)
    #[serde(default)]
    pub driver: StorageDriver,
    /// Directory for the local driver
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,
    /// URL prefix under which local files are served
    #[serde(default = "default_local_url_prefix")]
    pub local_url_prefix: String,
    /// S3 settings (used by the s3 driver)
    #[serde(default)]
    pub s3: S3Settings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            local_path: default_local_path(),
            local_url_prefix: default_local_url_prefix(),
            s3: S3Settings::default(),
        }
    }
}

fn default_local_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_local_url_prefix() -> String {
    "/uploads".to_string()
}

/// S3-compatible bucket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    /// Bucket name
    #[serde(default)]
    pub bucket: String,
    /// Region
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, Spaces)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key (falls back to the default credential chain)
    #[serde(default)]
    pub access_key: Option<String>,
    /// Secret key
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Public base URL for objects (CDN or bucket website)
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_s3_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            public_url: None,
        }
    }
}

fn default_s3_region() -> String {
    "us-east-1".to_string()
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host; mail is logged instead of sent when empty
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Sender display name
    #[serde(default = "default_mail_from_name")]
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from: default_mail_from(),
            from_name: default_mail_from_name(),
        }
    }
}

impl MailConfig {
    /// Whether an SMTP relay is configured
    pub fn is_configured(&self) -> bool {
        !self.smtp_host.trim().is_empty()
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "no-reply@hayproperty.com".to_string()
}

fn default_mail_from_name() -> String {
    "HAY Property".to_string()
}

/// Bootstrap administrator created on first start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminBootstrapConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - HAY_SERVER_HOST / HAY_SERVER_PORT / HAY_SERVER_CORS_ORIGIN / HAY_SERVER_PUBLIC_URL
    /// - HAY_DATABASE_URL
    /// - HAY_AUTH_JWT_SECRET / HAY_AUTH_SESSION_DAYS / HAY_AUTH_SECURE_COOKIES
    /// - HAY_STORAGE_DRIVER / HAY_STORAGE_LOCAL_PATH
    /// - HAY_S3_BUCKET / HAY_S3_REGION / HAY_S3_ENDPOINT / HAY_S3_ACCESS_KEY
    ///   / HAY_S3_SECRET_KEY / HAY_S3_PUBLIC_URL
    /// - HAY_SMTP_HOST / HAY_SMTP_PORT / HAY_SMTP_USERNAME / HAY_SMTP_PASSWORD / HAY_MAIL_FROM
    /// - HAY_ADMIN_NAME / HAY_ADMIN_EMAIL / HAY_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        let var = |name: &str| std::env::var(name).ok();

        // Server
        if let Some(host) = var("HAY_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("HAY_SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(origin) = var("HAY_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(url) = var("HAY_SERVER_PUBLIC_URL") {
            self.server.public_url = url;
        }

        // Database
        if let Some(url) = var("HAY_DATABASE_URL") {
            self.database.url = url;
        }

        // Auth
        if let Some(secret) = var("HAY_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(days) = var("HAY_AUTH_SESSION_DAYS").and_then(|d| d.parse::<i64>().ok()) {
            if days > 0 {
                self.auth.session_days = days;
            }
        }
        if let Some(secure) = var("HAY_AUTH_SECURE_COOKIES") {
            match secure.to_lowercase().as_str() {
                "true" | "1" => self.auth.secure_cookies = true,
                "false" | "0" => self.auth.secure_cookies = false,
                _ => {} // Ignore invalid values
            }
        }

        // Storage
        if let Some(driver) = var("HAY_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "local" => self.storage.driver = StorageDriver::Local,
                "s3" => self.storage.driver = StorageDriver::S3,
                _ => {} // Ignore invalid values
            }
        }
        if let Some(path) = var("HAY_STORAGE_LOCAL_PATH") {
            self.storage.local_path = PathBuf::from(path);
        }
        if let Some(bucket) = var("HAY_S3_BUCKET") {
            self.storage.s3.bucket = bucket;
        }
        if let Some(region) = var("HAY_S3_REGION") {
            self.storage.s3.region = region;
        }
        if let Some(endpoint) = var("HAY_S3_ENDPOINT") {
            self.storage.s3.endpoint = Some(endpoint);
        }
        if let Some(key) = var("HAY_S3_ACCESS_KEY") {
            self.storage.s3.access_key = Some(key);
        }
        if let Some(secret) = var("HAY_S3_SECRET_KEY") {
            self.storage.s3.secret_key = Some(secret);
        }
        if let Some(url) = var("HAY_S3_PUBLIC_URL") {
            self.storage.s3.public_url = Some(url);
        }

        // Mail
        if let Some(host) = var("HAY_SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Some(port) = var("HAY_SMTP_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.mail.smtp_port = port;
        }
        if let Some(username) = var("HAY_SMTP_USERNAME") {
            self.mail.smtp_username = username;
        }
        if let Some(password) = var("HAY_SMTP_PASSWORD") {
            self.mail.smtp_password = password;
        }
        if let Some(from) = var("HAY_MAIL_FROM") {
            self.mail.from = from;
        }

        // Bootstrap admin
        if let Some(name) = var("HAY_ADMIN_NAME") {
            self.admin.name = Some(name);
        }
        if let Some(email) = var("HAY_ADMIN_EMAIL") {
            self.admin.email = Some(email);
        }
        if let Some(password) = var("HAY_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
    }

    /// Check values that would make the server misbehave at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret is not set (config.yml or HAY_AUTH_JWT_SECRET)".to_string(),
            ));
        }
        if PLACEHOLDER_JWT_SECRETS.contains(&secret.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret is a well-known placeholder; generate a random secret".to_string(),
            ));
        }
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.auth.session_days <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_days must be positive".to_string(),
            ));
        }
        if self.storage.driver == StorageDriver::S3 && self.storage.s3.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.s3.bucket is required when storage.driver is s3".to_string(),
            ));
        }
        if self.storage.driver == StorageDriver::Local
            && (!self.storage.local_url_prefix.starts_with('/') || self.storage.local_url_prefix.len() < 2)
        {
            return Err(ConfigError::ValidationError(
                "storage.local_url_prefix must start with '/' and name a path".to_string(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    const ENV_VARS: &[&str] = &[
        "HAY_SERVER_HOST",
        "HAY_SERVER_PORT",
        "HAY_DATABASE_URL",
        "HAY_AUTH_JWT_SECRET",
        "HAY_AUTH_SESSION_DAYS",
        "HAY_STORAGE_DRIVER",
        "HAY_S3_BUCKET",
        "HAY_SMTP_HOST",
        "HAY_ADMIN_EMAIL",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "data/hay.db");
        assert_eq!(config.auth.session_days, 7);
        assert_eq!(config.storage.driver, StorageDriver::Local);
        assert_eq!(config.storage.local_path, PathBuf::from("uploads"));
        assert!(!config.mail.is_configured());
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 3000\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.ttl_seconds, 600);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
  public_url: "https://hayproperty.com"
database:
  url: "data/test.db"
auth:
  jwt_secret: "0f6c1d9e2b7a4c8e9d3f5a1b6c7e8d2f"
  session_days: 14
  secure_cookies: true
storage:
  driver: s3
  s3:
    bucket: "hay-images"
    region: "eu-west-2"
    endpoint: "https://minio.local"
mail:
  smtp_host: "smtp.example.com"
  smtp_port: 465
admin:
  email: "root@hayproperty.com"
  password: "bootstrap-pass"
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_url, "https://hayproperty.com");
        assert_eq!(config.database.url, "data/test.db");
        assert_eq!(config.auth.jwt_secret, "0f6c1d9e2b7a4c8e9d3f5a1b6c7e8d2f");
        assert_eq!(config.auth.session_days, 14);
        assert!(config.auth.secure_cookies);
        assert_eq!(config.storage.driver, StorageDriver::S3);
        assert_eq!(config.storage.s3.bucket, "hay-images");
        assert_eq!(config.storage.s3.endpoint.as_deref(), Some("https://minio.local"));
        assert_eq!(config.mail.smtp_port, 465);
        assert!(config.mail.is_configured());
        assert_eq!(config.admin.email.as_deref(), Some("root@hayproperty.com"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        std::env::set_var("HAY_SERVER_PORT", "4000");
        std::env::set_var("HAY_AUTH_JWT_SECRET", "from-env");
        std::env::set_var("HAY_STORAGE_DRIVER", "S3");
        std::env::set_var("HAY_S3_BUCKET", "env-bucket");
        std::env::set_var("HAY_ADMIN_EMAIL", "boss@hayproperty.com");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.storage.driver, StorageDriver::S3);
        assert_eq!(config.storage.s3.bucket, "env-bucket");
        assert_eq!(config.admin.email.as_deref(), Some("boss@hayproperty.com"));

        clear_env();
    }

    #[test]
    fn test_env_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("HAY_SERVER_PORT", "not-a-port");
        std::env::set_var("HAY_STORAGE_DRIVER", "ftp");
        std::env::set_var("HAY_AUTH_SESSION_DAYS", "-3");

        let config = Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.driver, StorageDriver::Local);
        assert_eq!(config.auth.session_days, 7);

        clear_env();
    }

    const TEST_SECRET: &str = "a3f9c2e71b8d4f60e5a7c1d93b2f8e46";

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.auth.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_rejects_weak_secrets() {
        let mut config = Config::default();
        for weak in ["change-me-in-production", "Change-Me-In-Production", "secret", "short-but-random"] {
            config.auth.jwt_secret = weak.to_string();
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "accepted {}",
                weak
            );
        }

        config.auth.jwt_secret = TEST_SECRET.to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_s3_without_bucket() {
        let mut config = Config::default();
        config.auth.jwt_secret = TEST_SECRET.to_string();
        config.storage.driver = StorageDriver::S3;
        assert!(config.validate().is_err());

        config.storage.s3.bucket = "images".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upload_extension_mapping() {
        let upload = UploadConfig::default();
        assert!(upload.is_type_allowed("image/png"));
        assert!(!upload.is_type_allowed("application/pdf"));
        assert_eq!(upload.get_extension("image/jpeg"), "jpg");
        assert_eq!(upload.get_extension("application/octet-stream"), "bin");
    }
}

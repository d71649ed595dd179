//! Object storage for uploaded images
//!
//! Two backends: the local filesystem (files served by the app under
//! `/uploads`) and any S3-compatible bucket.

pub mod filesystem;
pub mod s3;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::config::{StorageConfig, StorageDriver};

pub use filesystem::FilesystemStorage;
pub use s3::S3Storage;

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store an object under `key`
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<()>;

    /// Delete the object under `key`
    async fn delete(&self, key: &str) -> Result<()>;

    /// URL clients use to fetch the object
    fn public_url(&self, key: &str) -> String;

    /// Key of an object this backend serves at `url`, if any
    fn key_for_url(&self, url: &str) -> Option<String>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

pub type DynStorage = Arc<dyn StorageBackend>;

/// Build the configured storage backend
pub async fn create_storage(config: &StorageConfig) -> Result<DynStorage> {
    match config.driver {
        StorageDriver::Local => {
            let storage = FilesystemStorage::new(&config.local_path, &config.local_url_prefix);
            storage.ensure_root().await?;
            tracing::info!(path = %config.local_path.display(), "Using local upload storage");
            Ok(Arc::new(storage))
        }
        StorageDriver::S3 => {
            let storage = S3Storage::new(&config.s3)?;
            tracing::info!(bucket = %config.s3.bucket, "Using S3 upload storage");
            Ok(Arc::new(storage))
        }
    }
}

/// Reject keys that could escape the storage root or form odd URLs
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        bail!("Invalid storage key: {:?}", key);
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        bail!("Invalid storage key: {:?}", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("properties/abc.jpg").is_ok());
        assert!(validate_key("misc/x.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("../secret").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            local_path: dir.path().join("uploads"),
            ..Default::default()
        };
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.name(), "local");
        assert!(dir.path().join("uploads").is_dir());
        assert_eq!(storage.public_url("blogs/a.png"), "/uploads/blogs/a.png");
        assert_eq!(storage.key_for_url("/uploads/blogs/a.png").as_deref(), Some("blogs/a.png"));
    }
}

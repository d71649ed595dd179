//! Filesystem storage backend

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{validate_key, StorageBackend};

/// Stores uploads under a local directory
pub struct FilesystemStorage {
    base_path: PathBuf,
    url_prefix: String,
}

impl FilesystemStorage {
    pub fn new(base_path: impl AsRef<Path>, url_prefix: &str) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Create the root directory if it is missing
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", self.base_path))
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    async fn put(&self, key: &str, content: Bytes, _content_type: &str) -> Result<()> {
        let path = self.key_to_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let mut file = fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {:?}", path))?;
        file.write_all(&content)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        file.sync_all().await?;

        tracing::debug!(key = %key, size = content.len(), "Stored upload on disk");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {:?}", path)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        validate_key(key).ok()?;
        Some(key.to_string())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

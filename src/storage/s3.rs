//! S3 storage backend using the rust-s3 crate
//!
//! Works with AWS S3 and S3-compatible services (MinIO, R2, Spaces). A
//! custom endpoint switches the bucket to path-style addressing.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::{validate_key, StorageBackend};
use crate::config::S3Settings;

/// S3-compatible storage backend
pub struct S3Storage {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3Storage {
    pub fn new(settings: &S3Settings) -> Result<Self> {
        if settings.bucket.trim().is_empty() {
            bail!("S3 bucket is not configured");
        }

        // Explicit keys win; otherwise use the default credential chain
        let credentials = match (&settings.access_key, &settings.secret_key) {
            (Some(ak), Some(sk)) => Credentials::new(Some(ak.as_str()), Some(sk.as_str()), None, None, None)
                .map_err(|e| anyhow!("Invalid S3 credentials: {}", e))?,
            _ => Credentials::default().map_err(|e| anyhow!("Failed to load S3 credentials: {}", e))?,
        };

        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.trim_end_matches('/').to_string(),
            },
            None => settings
                .region
                .parse()
                .map_err(|_| anyhow!("Invalid S3 region: {}", settings.region))?,
        };

        let bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| anyhow!("Failed to create S3 bucket handle: {}", e))?;
        let bucket = if settings.endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self {
            bucket,
            public_base: public_base(settings),
        })
    }
}

/// Base URL objects are served from
fn public_base(settings: &S3Settings) -> String {
    if let Some(url) = settings.public_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return url.trim_end_matches('/').to_string();
    }
    match settings.endpoint.as_deref() {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), settings.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", settings.bucket, settings.region),
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_key(encoded: &str) -> Option<String> {
    encoded
        .split('/')
        .map(|seg| urlencoding::decode(seg).ok().map(|s| s.into_owned()))
        .collect::<Option<Vec<_>>>()
        .map(|segs| segs.join("/"))
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<()> {
        validate_key(key)?;
        let response = self
            .bucket
            .put_object_with_content_type(key, &content, content_type)
            .await
            .map_err(|e| anyhow!("Failed to put object '{}': {}", key, e))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            bail!("S3 rejected upload of '{}' with status {}", key, status);
        }

        tracing::debug!(key = %key, size = content.len(), "S3 put object successful");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| anyhow!("Failed to delete object '{}': {}", key, e))?;

        let status = response.status_code();
        // 404 means already gone
        if !(200..300).contains(&status) && status != 404 {
            bail!("S3 rejected delete of '{}' with status {}", key, status);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, encode_key(key))
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let encoded = url.strip_prefix(&self.public_base)?.strip_prefix('/')?;
        let key = decode_key(encoded)?;
        validate_key(&key).ok()?;
        Some(key)
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

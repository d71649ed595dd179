//! Upload API endpoints
//!
//! - POST /api/admin/uploads/image - Upload a single image (field `file`)
//! - POST /api/admin/uploads/images - Upload several images (fields `files` or `file`)
//!
//! An optional `folder` query picks the key prefix. Objects are stored as
//! `{folder}/{uuid}.{ext}` through the configured storage backend. Customer
//! avatars go to `avatars/{user_id}/{uuid}.{ext}` and must be raster images.

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::AppState;
use crate::api::responses::{ok, ApiError, ApiQuery};
use crate::config::UploadConfig;

/// Upper bound on files accepted by one `/images` request
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Avatar content types; SVG is excluded since it can carry script
pub const AVATAR_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Key prefix for an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadFolder {
    Properties,
    Blogs,
    Avatars,
    #[default]
    Misc,
}

impl UploadFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Properties => "properties",
            UploadFolder::Blogs => "blogs",
            UploadFolder::Avatars => "avatars",
            UploadFolder::Misc => "misc",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub folder: UploadFolder,
}

/// Response for a stored file
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
}

/// Response for multiple uploads
#[derive(Debug, Serialize)]
pub struct MultiUploadResponse {
    pub files: Vec<UploadResponse>,
    pub failed: Vec<String>,
}

/// Build the upload router (mounted under `/admin/uploads`)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image))
        .route("/images", post(upload_images))
}

/// Check and store one multipart file field
pub async fn store_image(
    state: &AppState,
    folder: UploadFolder,
    field: Field<'_>,
) -> Result<UploadResponse, ApiError> {
    let allowed: Vec<&str> = state.config.upload.allowed_types.iter().map(String::as_str).collect();
    store_field(state, folder.as_str(), &allowed, field).await
}

/// Check and store a customer's avatar under their own key prefix
pub async fn store_avatar(
    state: &AppState,
    user_id: i64,
    field: Field<'_>,
) -> Result<UploadResponse, ApiError> {
    let allowed = avatar_types(&state.config.upload);
    store_field(state, &avatar_prefix(user_id), &allowed, field).await
}

/// Delete a replaced avatar if it is one of this user's uploads
pub async fn discard_avatar(state: &AppState, user_id: i64, url: &str) {
    let Some(key) = state.storage.key_for_url(url) else {
        return;
    };
    if !owns_avatar_key(user_id, &key) {
        return;
    }
    match state.storage.delete(&key).await {
        Ok(()) => tracing::info!(key = %key, user_id, "Removed old avatar"),
        Err(e) => tracing::warn!(key = %key, user_id, "Failed to remove old avatar: {:#}", e),
    }
}

fn avatar_prefix(user_id: i64) -> String {
    format!("{}/{}", UploadFolder::Avatars.as_str(), user_id)
}

fn owns_avatar_key(user_id: i64, key: &str) -> bool {
    key.strip_prefix(&avatar_prefix(user_id))
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Configured types narrowed to raster images
fn avatar_types(config: &UploadConfig) -> Vec<&'static str> {
    AVATAR_TYPES
        .iter()
        .copied()
        .filter(|t| config.is_type_allowed(t))
        .collect()
}

async fn store_field(
    state: &AppState,
    prefix: &str,
    allowed: &[&str],
    field: Field<'_>,
) -> Result<UploadResponse, ApiError> {
    let filename = field.file_name().unwrap_or("unknown").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    if !allowed.contains(&content_type.as_str()) {
        return Err(ApiError::validation(format!(
            "Invalid file type: {}. Allowed types: {}",
            content_type,
            allowed.join(", ")
        )));
    }

    let data = field.bytes().await?;
    check_size(data.len() as u64, state.config.upload.max_file_size)?;

    put_object(state, prefix, &filename, &content_type, data).await
}

fn check_size(size: u64, max: u64) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::validation("File is empty"));
    }
    if size > max {
        return Err(ApiError::payload_too_large(format!(
            "File too large. Maximum size: {} MB",
            max / 1024 / 1024
        )));
    }
    Ok(())
}

async fn put_object(
    state: &AppState,
    prefix: &str,
    filename: &str,
    content_type: &str,
    data: Bytes,
) -> Result<UploadResponse, ApiError> {
    let ext = state.config.upload.get_extension(content_type);
    let key = object_key(prefix, ext);
    let size = data.len() as u64;

    state
        .storage
        .put(&key, data, content_type)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload {}: {:#}", key, e)))?;

    tracing::info!(key = %key, size, backend = state.storage.name(), "Stored upload");

    Ok(UploadResponse {
        url: state.storage.public_url(&key),
        filename: filename.to_string(),
        key,
        size,
        content_type: content_type.to_string(),
    })
}

fn object_key(prefix: &str, ext: &str) -> String {
    format!("{}/{}.{}", prefix, Uuid::new_v4(), ext)
}

/// POST /api/admin/uploads/image
async fn upload_image(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let uploaded = store_image(&state, query.folder, field).await?;
        return Ok((StatusCode::CREATED, ok(uploaded)));
    }

    Err(ApiError::validation("No file provided"))
}

/// POST /api/admin/uploads/images
///
/// Files that fail validation or storage are listed in `failed`; the rest
/// are stored.
async fn upload_images(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files = Vec::new();
    let mut failed = Vec::new();
    let mut seen = 0usize;

    while let Some(field) = multipart.next_field().await? {
        if !matches!(field.name(), Some("files") | Some("file")) {
            continue;
        }
        seen += 1;
        let filename = field.file_name().unwrap_or("unknown").to_string();

        if seen > MAX_FILES_PER_REQUEST {
            failed.push(format!(
                "{}: at most {} files per request",
                filename, MAX_FILES_PER_REQUEST
            ));
            continue;
        }

        match store_image(&state, query.folder, field).await {
            Ok(uploaded) => files.push(uploaded),
            Err(e) if e.code == "INTERNAL_ERROR" => {
                failed.push(format!("{}: could not be stored", filename))
            }
            Err(e) => failed.push(format!("{}: {}", filename, e.message)),
        }
    }

    if seen == 0 {
        return Err(ApiError::validation("No files provided"));
    }

    Ok(ok(MultiUploadResponse { files, failed }))
}

//! Wishlist service

use crate::db::repositories::{PropertyRepository, WishlistRepository};
use crate::models::PropertySummary;
use crate::services::error::{ServiceError, ServiceResult};
use anyhow::Context;
use std::sync::Arc;

/// Saved properties per user
pub struct WishlistService {
    repo: Arc<dyn WishlistRepository>,
    property_repo: Arc<dyn PropertyRepository>,
}

impl WishlistService {
    pub fn new(repo: Arc<dyn WishlistRepository>, property_repo: Arc<dyn PropertyRepository>) -> Self {
        Self { repo, property_repo }
    }

    /// Saved properties, most recently added first
    pub async fn list(&self, user_id: i64) -> ServiceResult<Vec<PropertySummary>> {
        let ids = self
            .repo
            .list_property_ids(user_id)
            .await
            .context("Failed to list wishlist")?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(property) = self
                .property_repo
                .get_by_id(id)
                .await
                .context("Failed to load wishlist property")?
            {
                items.push(PropertySummary::from(&property));
            }
        }
        Ok(items)
    }

    /// Save a published property; saving twice is a no-op
    pub async fn add(&self, user_id: i64, property_id: i64) -> ServiceResult<()> {
        self.property_repo
            .get_by_id(property_id)
            .await
            .context("Failed to get property")?
            .filter(|p| p.is_published)
            .ok_or_else(|| ServiceError::not_found("Property"))?;

        self.repo
            .add(user_id, property_id)
            .await
            .context("Failed to add to wishlist")?;
        Ok(())
    }

    /// Remove a property; removing an unsaved one is a no-op
    pub async fn remove(&self, user_id: i64, property_id: i64) -> ServiceResult<()> {
        self.repo
            .remove(user_id, property_id)
            .await
            .context("Failed to remove from wishlist")?;
        Ok(())
    }
}

//! Property listing service
//!
//! Public search and detail pages, admin CRUD and the slug rules.

use crate::cache::{keys, CacheLayer, SharedCache};
use crate::db::repositories::{PropertyRepository, PurchaseRepository};
use crate::models::{
    CreatePropertyInput, ListParams, PagedResult, Property, PropertyFilter, PropertyStatus,
    UpdatePropertyInput,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::slug::{generate_slug, slug_or, unique_slug};
use crate::services::validation::required;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Property service
pub struct PropertyService {
    repo: Arc<dyn PropertyRepository>,
    purchase_repo: Arc<dyn PurchaseRepository>,
    cache: SharedCache,
}

impl PropertyService {
    pub fn new(
        repo: Arc<dyn PropertyRepository>,
        purchase_repo: Arc<dyn PurchaseRepository>,
        cache: SharedCache,
    ) -> Self {
        Self {
            repo,
            purchase_repo,
            cache,
        }
    }

    /// Published listings matching the filter
    pub async fn list_public(
        &self,
        mut filter: PropertyFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<Property>> {
        filter.published_only = true;
        self.list(&filter, params).await
    }

    /// All listings matching the filter, published or not
    pub async fn list_admin(
        &self,
        mut filter: PropertyFilter,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<Property>> {
        filter.published_only = false;
        self.list(&filter, params).await
    }

    async fn list(&self, filter: &PropertyFilter, params: &ListParams) -> ServiceResult<PagedResult<Property>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(ServiceError::validation("min_price cannot exceed max_price"));
            }
        }
        let (items, total) = self
            .repo
            .list(filter, params.offset(), params.limit())
            .await
            .context("Failed to list properties")?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Published listing by slug, served from cache when possible
    pub async fn get_published_by_slug(&self, slug: &str) -> ServiceResult<Property> {
        let key = keys::property_slug(slug);
        if let Ok(Some(property)) = self.cache.get::<Property>(&key).await {
            return Ok(property);
        }

        let property = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to get property")?
            .filter(|p| p.is_published)
            .ok_or_else(|| ServiceError::not_found("Property"))?;

        if let Err(e) = self.cache.set(&key, &property, self.cache.default_ttl()).await {
            tracing::warn!("Failed to cache property {}: {:#}", slug, e);
        }
        Ok(property)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<Property> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get property")?
            .ok_or_else(|| ServiceError::not_found("Property"))
    }

    pub async fn create(&self, input: CreatePropertyInput) -> ServiceResult<Property> {
        let title = required(&input.title, "Title")?;
        validate_numbers(Some(input.price), input.bedrooms, input.bathrooms, input.size_sqm)?;

        let base = match input.slug.as_deref() {
            Some(explicit) if !explicit.trim().is_empty() => {
                let slug = generate_slug(explicit);
                if slug.is_empty() {
                    return Err(ServiceError::validation("Slug must contain letters or digits"));
                }
                slug
            }
            _ => slug_or(&title, "property"),
        };
        let repo = self.repo.clone();
        let slug = unique_slug(&base, |candidate| {
            let repo = repo.clone();
            async move { repo.slug_exists(&candidate, None).await }
        })
        .await?;

        let now = Utc::now();
        let property = Property {
            id: 0,
            slug,
            title,
            description: input.description.trim().to_string(),
            location: input.location.trim().to_string(),
            city: input.city.trim().to_string(),
            price: input.price,
            property_type: input.property_type,
            status: input.status.unwrap_or_default(),
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            size_sqm: input.size_sqm,
            features: clean_list(input.features),
            images: clean_list(input.images),
            is_featured: input.is_featured,
            is_published: input.is_published,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&property).await.context("Failed to create property")?;
        tracing::info!(property_id = created.id, slug = %created.slug, "Property created");
        Ok(created)
    }

    /// Apply an update. A new title keeps the old slug; a new explicit slug
    /// must not be taken.
    pub async fn update(&self, id: i64, input: UpdatePropertyInput) -> ServiceResult<Property> {
        let mut property = self.get_by_id(id).await?;
        let old_slug = property.slug.clone();
        validate_numbers(input.price, input.bedrooms, input.bathrooms, input.size_sqm)?;

        if let Some(slug) = input.slug.as_deref() {
            let slug = generate_slug(slug);
            if slug.is_empty() {
                return Err(ServiceError::validation("Slug must contain letters or digits"));
            }
            if slug != property.slug {
                if self
                    .repo
                    .slug_exists(&slug, Some(id))
                    .await
                    .context("Failed to check slug")?
                {
                    return Err(ServiceError::conflict(format!("Slug '{}' is already in use", slug)));
                }
                property.slug = slug;
            }
        }

        if let Some(title) = input.title {
            property.title = required(&title, "Title")?;
        }
        if let Some(v) = input.description {
            property.description = v.trim().to_string();
        }
        if let Some(v) = input.location {
            property.location = v.trim().to_string();
        }
        if let Some(v) = input.city {
            property.city = v.trim().to_string();
        }
        if let Some(v) = input.price {
            property.price = v;
        }
        if let Some(v) = input.property_type {
            property.property_type = v;
        }
        if let Some(v) = input.status {
            property.status = v;
        }
        if input.bedrooms.is_some() {
            property.bedrooms = input.bedrooms;
        }
        if input.bathrooms.is_some() {
            property.bathrooms = input.bathrooms;
        }
        if input.size_sqm.is_some() {
            property.size_sqm = input.size_sqm;
        }
        if let Some(v) = input.features {
            property.features = clean_list(v);
        }
        if let Some(v) = input.images {
            property.images = clean_list(v);
        }
        if let Some(v) = input.is_featured {
            property.is_featured = v;
        }
        if let Some(v) = input.is_published {
            property.is_published = v;
        }

        let updated = self.repo.update(&property).await.context("Failed to update property")?;
        self.invalidate(&old_slug).await;
        if updated.slug != old_slug {
            self.invalidate(&updated.slug).await;
        }
        Ok(updated)
    }

    /// Delete a property that has no purchases
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let property = self.get_by_id(id).await?;

        let purchases = self
            .purchase_repo
            .count_for_property(id)
            .await
            .context("Failed to count purchases")?;
        if purchases > 0 {
            return Err(ServiceError::conflict(
                "Property has purchases and cannot be deleted",
            ));
        }

        self.repo.delete(id).await.context("Failed to delete property")?;
        self.invalidate(&property.slug).await;
        tracing::info!(property_id = id, "Property deleted");
        Ok(())
    }

    /// Change the sale status, as driven by purchases
    pub async fn set_status(&self, property: &Property, status: PropertyStatus) -> ServiceResult<()> {
        if property.status == status {
            return Ok(());
        }
        self.repo
            .set_status(property.id, status)
            .await
            .context("Failed to set property status")?;
        self.invalidate(&property.slug).await;
        tracing::debug!(property_id = property.id, %status, "Property status changed");
        Ok(())
    }

    async fn invalidate(&self, slug: &str) {
        if let Err(e) = self.cache.delete(&keys::property_slug(slug)).await {
            tracing::warn!("Failed to invalidate property cache for {}: {:#}", slug, e);
        }
    }
}

fn validate_numbers(
    price: Option<i64>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    size_sqm: Option<f64>,
) -> ServiceResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(ServiceError::validation("Price cannot be negative"));
    }
    if bedrooms.is_some_and(|n| n < 0) || bathrooms.is_some_and(|n| n < 0) {
        return Err(ServiceError::validation("Room counts cannot be negative"));
    }
    if size_sqm.is_some_and(|s| !s.is_finite() || s < 0.0) {
        return Err(ServiceError::validation("Size must be a positive number"));
    }
    Ok(())
}

/// Trim entries and drop blanks
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

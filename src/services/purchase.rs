//! Purchase tracker service
//!
//! Admins record purchases and tick off development phases; buyers follow
//! their own purchases. Saving a purchase keeps its status in line with
//! the phase flags and moves the property between available, reserved and
//! sold.

use crate::db::repositories::{PurchaseRepository, UserRepository};
use crate::models::{
    CreatePurchaseInput, ListParams, PagedResult, PropertyStatus, PropertySummary, Purchase,
    PurchaseFilter, PurchaseStatus, PurchaseView, UpdatePurchaseInput,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::property::PropertyService;
use crate::services::validation::optional;
use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Purchase service
pub struct PurchaseService {
    repo: Arc<dyn PurchaseRepository>,
    user_repo: Arc<dyn UserRepository>,
    properties: Arc<PropertyService>,
}

impl PurchaseService {
    pub fn new(
        repo: Arc<dyn PurchaseRepository>,
        user_repo: Arc<dyn UserRepository>,
        properties: Arc<PropertyService>,
    ) -> Self {
        Self {
            repo,
            user_repo,
            properties,
        }
    }

    /// Record a purchase of a property by a user
    pub async fn create(&self, input: CreatePurchaseInput) -> ServiceResult<PurchaseView> {
        self.user_repo
            .get_by_id(input.user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        let property = self.properties.get_by_id(input.property_id).await?;
        if property.status == PropertyStatus::Sold {
            return Err(ServiceError::conflict("Property has already been sold"));
        }

        let total_amount = input.total_amount.unwrap_or(property.price);
        validate_amounts(total_amount, input.amount_paid)?;

        let now = Utc::now();
        let mut purchase = Purchase {
            id: 0,
            user_id: input.user_id,
            property_id: input.property_id,
            total_amount,
            amount_paid: input.amount_paid,
            status: PurchaseStatus::Pending,
            phases: input.phases,
            notes: optional(input.notes),
            created_at: now,
            updated_at: now,
        };
        purchase.sync_status();

        let created = self.repo.create(&purchase).await.context("Failed to create purchase")?;
        tracing::info!(
            purchase_id = created.id,
            user_id = created.user_id,
            property_id = created.property_id,
            "Purchase created"
        );

        let target = if created.status == PurchaseStatus::Completed {
            PropertyStatus::Sold
        } else {
            PropertyStatus::Reserved
        };
        self.properties.set_status(&property, target).await?;

        self.view(created).await
    }

    /// Apply an admin update and propagate the result to the property
    pub async fn update(&self, id: i64, input: UpdatePurchaseInput) -> ServiceResult<PurchaseView> {
        let mut purchase = self.get(id).await?;
        let previous = purchase.status;

        if let Some(total) = input.total_amount {
            purchase.total_amount = total;
        }
        if let Some(paid) = input.amount_paid {
            purchase.amount_paid = paid;
        }
        validate_amounts(purchase.total_amount, purchase.amount_paid)?;

        if let Some(phases) = input.phases {
            purchase.phases = phases;
        }
        if let Some(status) = input.status {
            purchase.status = status;
        }
        if let Some(notes) = input.notes {
            purchase.notes = optional(Some(notes));
        }
        purchase.sync_status();

        let updated = self.repo.update(&purchase).await.context("Failed to update purchase")?;
        if updated.status != previous {
            tracing::info!(purchase_id = id, from = %previous, to = %updated.status, "Purchase status changed");
        }

        self.sync_property(&updated).await?;
        self.view(updated).await
    }

    /// Delete a purchase, releasing the property when nothing else holds it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let purchase = self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete purchase")?;
        tracing::info!(purchase_id = id, "Purchase deleted");

        if purchase.status != PurchaseStatus::Cancelled {
            self.release_property(purchase.property_id, None).await?;
        }
        Ok(())
    }

    /// Delete every purchase of a buyer, settling each property on the way.
    ///
    /// Runs before the account itself is removed; returns how many purchases
    /// were dropped.
    pub async fn remove_for_user(&self, user_id: i64) -> ServiceResult<usize> {
        let purchases = self
            .repo
            .list_for_user(user_id)
            .await
            .context("Failed to list purchases")?;
        for purchase in &purchases {
            self.delete(purchase.id).await?;
        }
        Ok(purchases.len())
    }

    /// Admin view of one purchase
    pub async fn get_view(&self, id: i64) -> ServiceResult<PurchaseView> {
        let purchase = self.get(id).await?;
        self.view(purchase).await
    }

    /// Admin list
    pub async fn list(&self, filter: &PurchaseFilter, params: &ListParams) -> ServiceResult<PagedResult<PurchaseView>> {
        let (purchases, total) = self
            .repo
            .list(filter, params.offset(), params.limit())
            .await
            .context("Failed to list purchases")?;
        let views = self.views(purchases).await?;
        Ok(PagedResult::new(views, total, params))
    }

    /// A buyer's own purchases, newest first
    pub async fn list_for_user(&self, user_id: i64) -> ServiceResult<Vec<PurchaseView>> {
        let purchases = self
            .repo
            .list_for_user(user_id)
            .await
            .context("Failed to list purchases")?;
        self.views(purchases).await
    }

    /// One of a buyer's purchases; other users' purchases are not found
    pub async fn get_for_user(&self, user_id: i64, id: i64) -> ServiceResult<PurchaseView> {
        let purchase = self.get(id).await?;
        if purchase.user_id != user_id {
            return Err(ServiceError::not_found("Purchase"));
        }
        self.view(purchase).await
    }

    async fn get(&self, id: i64) -> ServiceResult<Purchase> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get purchase")?
            .ok_or_else(|| ServiceError::not_found("Purchase"))
    }

    async fn sync_property(&self, purchase: &Purchase) -> ServiceResult<()> {
        let property = self.properties.get_by_id(purchase.property_id).await?;
        match purchase.status {
            PurchaseStatus::Completed => {
                self.properties.set_status(&property, PropertyStatus::Sold).await?;
            }
            PurchaseStatus::Cancelled => {
                self.release_property(purchase.property_id, Some(purchase.id)).await?;
            }
            PurchaseStatus::Pending | PurchaseStatus::InProgress => {
                let reserve = match property.status {
                    PropertyStatus::Available => true,
                    // A completed purchase was reopened
                    PropertyStatus::Sold => {
                        self.completed_elsewhere(purchase.property_id, Some(purchase.id))
                            .await?
                            == 0
                    }
                    PropertyStatus::Reserved => false,
                };
                if reserve {
                    self.properties.set_status(&property, PropertyStatus::Reserved).await?;
                }
            }
        }
        Ok(())
    }

    /// Settle a property once one of its purchases stops holding it.
    ///
    /// Another completed purchase keeps it sold, an active one keeps it
    /// reserved, otherwise it is available again.
    async fn release_property(&self, property_id: i64, exclude: Option<i64>) -> ServiceResult<()> {
        if self.completed_elsewhere(property_id, exclude).await? > 0 {
            return Ok(());
        }
        let active = self
            .repo
            .count_active_for_property(property_id, exclude)
            .await
            .context("Failed to count active purchases")?;

        let property = self.properties.get_by_id(property_id).await?;
        let target = if active > 0 {
            PropertyStatus::Reserved
        } else {
            PropertyStatus::Available
        };
        self.properties.set_status(&property, target).await
    }

    async fn completed_elsewhere(&self, property_id: i64, exclude: Option<i64>) -> ServiceResult<i64> {
        Ok(self
            .repo
            .count_completed_for_property(property_id, exclude)
            .await
            .context("Failed to count completed purchases")?)
    }

    async fn view(&self, purchase: Purchase) -> ServiceResult<PurchaseView> {
        let property = match self.properties.get_by_id(purchase.property_id).await {
            Ok(p) => Some(PropertySummary::from(&p)),
            Err(ServiceError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(PurchaseView::new(purchase, property))
    }

    async fn views(&self, purchases: Vec<Purchase>) -> ServiceResult<Vec<PurchaseView>> {
        let mut summaries: HashMap<i64, Option<PropertySummary>> = HashMap::new();
        let mut views = Vec::with_capacity(purchases.len());

        for purchase in purchases {
            if !summaries.contains_key(&purchase.property_id) {
                let summary = match self.properties.get_by_id(purchase.property_id).await {
                    Ok(p) => Some(PropertySummary::from(&p)),
                    Err(ServiceError::NotFound(_)) => None,
                    Err(e) => return Err(e),
                };
                summaries.insert(purchase.property_id, summary);
            }
            let summary = summaries.get(&purchase.property_id).cloned().flatten();
            views.push(PurchaseView::new(purchase, summary));
        }
        Ok(views)
    }
}

fn validate_amounts(total: i64, paid: i64) -> ServiceResult<()> {
    if total < 0 {
        return Err(ServiceError::validation("Total amount cannot be negative"));
    }
    if paid < 0 {
        return Err(ServiceError::validation("Amount paid cannot be negative"));
    }
    if paid > total {
        return Err(ServiceError::validation("Amount paid cannot exceed the total amount"));
    }
    Ok(())
}

//! Contact inquiry service

use crate::db::repositories::{InquiryRepository, PropertyRepository};
use crate::models::{CreateInquiryInput, Inquiry, InquiryStatus, ListParams, PagedResult};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::validation::{normalize_email, optional, required};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Longest accepted message, in characters
pub const MAX_MESSAGE_LENGTH: usize = 5_000;

/// Inquiry service
pub struct InquiryService {
    repo: Arc<dyn InquiryRepository>,
    property_repo: Arc<dyn PropertyRepository>,
}

impl InquiryService {
    pub fn new(repo: Arc<dyn InquiryRepository>, property_repo: Arc<dyn PropertyRepository>) -> Self {
        Self { repo, property_repo }
    }

    /// Store a contact form submission
    pub async fn submit(&self, input: CreateInquiryInput) -> ServiceResult<Inquiry> {
        let name = required(&input.name, "Name")?;
        let email = normalize_email(&input.email)?;
        let message = required(&input.message, "Message")?;
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ServiceError::validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        if let Some(property_id) = input.property_id {
            if self
                .property_repo
                .get_by_id(property_id)
                .await
                .context("Failed to get property")?
                .is_none()
            {
                return Err(ServiceError::validation("Property does not exist"));
            }
        }

        let inquiry = Inquiry {
            id: 0,
            property_id: input.property_id,
            name,
            email,
            phone: optional(input.phone),
            message,
            status: InquiryStatus::New,
            created_at: Utc::now(),
        };
        let created = self.repo.create(&inquiry).await.context("Failed to save inquiry")?;
        tracing::info!(inquiry_id = created.id, property_id = ?created.property_id, "Inquiry received");
        Ok(created)
    }

    pub async fn list(&self, status: Option<InquiryStatus>, params: &ListParams) -> ServiceResult<PagedResult<Inquiry>> {
        let (items, total) = self
            .repo
            .list(status, params.offset(), params.limit())
            .await
            .context("Failed to list inquiries")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn set_status(&self, id: i64, status: InquiryStatus) -> ServiceResult<Inquiry> {
        self.get(id).await?;
        self.repo
            .set_status(id, status)
            .await
            .context("Failed to update inquiry")?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.repo.delete(id).await.context("Failed to delete inquiry")?;
        Ok(())
    }

    async fn get(&self, id: i64) -> ServiceResult<Inquiry> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get inquiry")?
            .ok_or_else(|| ServiceError::not_found("Inquiry"))
    }
}

//! Newsletter subscription service

use crate::db::repositories::NewsletterRepository;
use crate::models::{ListParams, NewsletterSubscriber, PagedResult};
use crate::services::error::ServiceResult;
use crate::services::validation::normalize_email;
use anyhow::Context;
use std::sync::Arc;

pub struct NewsletterService {
    repo: Arc<dyn NewsletterRepository>,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterRepository>) -> Self {
        Self { repo }
    }

    /// Subscribe, re-activating an address that unsubscribed earlier
    pub async fn subscribe(&self, email: &str) -> ServiceResult<NewsletterSubscriber> {
        let email = normalize_email(email)?;
        Ok(self.repo.subscribe(&email).await.context("Failed to subscribe")?)
    }

    /// Unsubscribe; unknown or inactive addresses are accepted silently
    pub async fn unsubscribe(&self, email: &str) -> ServiceResult<()> {
        let email = normalize_email(email)?;
        if self.repo.unsubscribe(&email).await.context("Failed to unsubscribe")? {
            tracing::debug!("Newsletter subscriber deactivated");
        }
        Ok(())
    }

    pub async fn list(&self, active_only: bool, params: &ListParams) -> ServiceResult<PagedResult<NewsletterSubscriber>> {
        let (items, total) = self
            .repo
            .list(active_only, params.offset(), params.limit())
            .await
            .context("Failed to list subscribers")?;
        Ok(PagedResult::new(items, total, params))
    }
}

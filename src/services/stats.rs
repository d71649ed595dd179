//! Back office dashboard counters

use crate::db::repositories::{
    BlogRepository, InquiryRepository, NewsletterRepository, PropertyRepository,
    PurchaseRepository, UserRepository,
};
use crate::models::InquiryStatus;
use crate::services::error::ServiceResult;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Dashboard statistics
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: i64,
    pub properties: StatusCounts,
    pub purchases: StatusCounts,
    pub published_blogs: i64,
    pub new_inquiries: i64,
    pub active_subscribers: i64,
}

/// Total plus a per-status breakdown
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

impl StatusCounts {
    fn from_pairs<S: ToString>(pairs: Vec<(S, i64)>) -> Self {
        let by_status: BTreeMap<String, i64> =
            pairs.into_iter().map(|(s, n)| (s.to_string(), n)).collect();
        Self {
            total: by_status.values().sum(),
            by_status,
        }
    }
}

/// Aggregates counts across repositories
pub struct StatsService {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    blogs: Arc<dyn BlogRepository>,
    inquiries: Arc<dyn InquiryRepository>,
    newsletter: Arc<dyn NewsletterRepository>,
}

impl StatsService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        blogs: Arc<dyn BlogRepository>,
        inquiries: Arc<dyn InquiryRepository>,
        newsletter: Arc<dyn NewsletterRepository>,
    ) -> Self {
        Self {
            users,
            properties,
            purchases,
            blogs,
            inquiries,
            newsletter,
        }
    }

    pub async fn dashboard(&self) -> ServiceResult<DashboardStats> {
        let (users, properties, purchases, published_blogs, new_inquiries, active_subscribers) = tokio::try_join!(
            self.users.count(),
            self.properties.count_by_status(),
            self.purchases.count_by_status(),
            self.blogs.count_published(),
            self.inquiries.count_by_status(InquiryStatus::New),
            self.newsletter.count_active(),
        )
        .context("Failed to collect dashboard stats")?;

        Ok(DashboardStats {
            users,
            properties: StatusCounts::from_pairs(properties),
            purchases: StatusCounts::from_pairs(purchases),
            published_blogs,
            new_inquiries,
            active_subscribers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::property::tests::{create_input, service_for};

    #[tokio::test]
    async fn test_dashboard_counts() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let properties = service_for(pool.clone());
        properties.create(create_input("One", 1)).await.unwrap();
        properties.create(create_input("Two", 2)).await.unwrap();

        let newsletter = SqlxNewsletterRepository::new(pool.clone());
        newsletter.subscribe("a@x.com").await.unwrap();

        let stats = StatsService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxPropertyRepository::boxed(pool.clone()),
            SqlxPurchaseRepository::boxed(pool.clone()),
            SqlxBlogRepository::boxed(pool.clone()),
            SqlxInquiryRepository::boxed(pool.clone()),
            SqlxNewsletterRepository::boxed(pool),
        );

        let dashboard = stats.dashboard().await.unwrap();
        assert_eq!(dashboard.users, 0);
        assert_eq!(dashboard.properties.total, 2);
        assert_eq!(dashboard.properties.by_status.get("available"), Some(&2));
        assert_eq!(dashboard.purchases.total, 0);
        assert_eq!(dashboard.published_blogs, 0);
        assert_eq!(dashboard.new_inquiries, 0);
        assert_eq!(dashboard.active_subscribers, 1);
    }
}

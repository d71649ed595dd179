//! Newsletter subscriber repository

use crate::db::DynDatabasePool;
use crate::models::NewsletterSubscriber;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Newsletter repository trait
#[async_trait]
pub trait NewsletterRepository: Send + Sync {
    /// Insert or re-activate a subscriber
    async fn subscribe(&self, email: &str) -> Result<NewsletterSubscriber>;

    /// Mark a subscriber inactive; returns false when the address is unknown
    async fn unsubscribe(&self, email: &str) -> Result<bool>;

    async fn get_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>>;

    /// Newest first
    async fn list(&self, active_only: bool, offset: i64, limit: i64) -> Result<(Vec<NewsletterSubscriber>, i64)>;

    async fn count_active(&self) -> Result<i64>;
}

/// SQLx-based newsletter repository implementation
pub struct SqlxNewsletterRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsletterRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsletterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsletterRepository for SqlxNewsletterRepository {
    async fn subscribe(&self, email: &str) -> Result<NewsletterSubscriber> {
        sqlx::query(
            r#"
            INSERT INTO newsletter_subscribers (email, is_active, created_at)
            VALUES (?, 1, ?)
            ON CONFLICT(email) DO UPDATE SET is_active = 1, unsubscribed_at = NULL
            "#,
        )
        .bind(email)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .context("Failed to subscribe")?;

        self.get_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Subscriber not found after subscribe"))
    }

    async fn unsubscribe(&self, email: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE newsletter_subscribers SET is_active = 0, unsubscribed_at = ? WHERE email = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(email)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to unsubscribe")?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<NewsletterSubscriber>> {
        let row = sqlx::query(
            "SELECT id, email, is_active, created_at, unsubscribed_at FROM newsletter_subscribers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get subscriber")?;

        Ok(row.as_ref().map(row_to_subscriber))
    }

    async fn list(&self, active_only: bool, offset: i64, limit: i64) -> Result<(Vec<NewsletterSubscriber>, i64)> {
        let where_clause = if active_only { " WHERE is_active = 1" } else { "" };

        let rows = sqlx::query(&format!(
            "SELECT id, email, is_active, created_at, unsubscribed_at FROM newsletter_subscribers{} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list subscribers")?;

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) as count FROM newsletter_subscribers{}",
            where_clause
        ))
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count subscribers")?
        .get("count");

        Ok((rows.iter().map(row_to_subscriber).collect(), total))
    }

    async fn count_active(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM newsletter_subscribers WHERE is_active = 1")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count subscribers")?;
        Ok(row.get("count"))
    }
}

fn row_to_subscriber(row: &sqlx::sqlite::SqliteRow) -> NewsletterSubscriber {
    NewsletterSubscriber {
        id: row.get("id"),
        email: row.get("email"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        unsubscribed_at: row.get("unsubscribed_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_subscribe_unsubscribe_resubscribe() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxNewsletterRepository::new(pool);

        let s = repo.subscribe("a@x.com").await.unwrap();
        assert!(s.is_active);
        repo.subscribe("a@x.com").await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 1);

        assert!(repo.unsubscribe("a@x.com").await.unwrap());
        assert!(!repo.unsubscribe("a@x.com").await.unwrap());
        assert!(!repo.unsubscribe("nobody@x.com").await.unwrap());

        let s = repo.get_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!s.is_active);
        assert!(s.unsubscribed_at.is_some());
        let (active, _) = repo.list(true, 0, 10).await.unwrap();
        assert!(active.is_empty());

        let again = repo.subscribe("a@x.com").await.unwrap();
        assert!(again.is_active);
        assert!(again.unsubscribed_at.is_none());
        assert_eq!(again.id, s.id);
    }
}

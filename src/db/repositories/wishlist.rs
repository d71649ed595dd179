//! Wishlist repository

use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Wishlist repository trait
#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Add a property; adding twice is a no-op
    async fn add(&self, user_id: i64, property_id: i64) -> Result<()>;

    /// Remove a property; removing a missing entry is a no-op
    async fn remove(&self, user_id: i64, property_id: i64) -> Result<()>;

    /// Property IDs in the user's wishlist, most recently added first
    async fn list_property_ids(&self, user_id: i64) -> Result<Vec<i64>>;
}

/// SQLx-based wishlist repository implementation
pub struct SqlxWishlistRepository {
    pool: DynDatabasePool,
}

impl SqlxWishlistRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn WishlistRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WishlistRepository for SqlxWishlistRepository {
    async fn add(&self, user_id: i64, property_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO wishlist_items (user_id, property_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(property_id)
        .bind(Utc::now())
        .execute(self.pool.sqlite())
        .await
        .context("Failed to add wishlist item")?;
        Ok(())
    }

    async fn remove(&self, user_id: i64, property_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM wishlist_items WHERE user_id = ? AND property_id = ?")
            .bind(user_id)
            .bind(property_id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to remove wishlist item")?;
        Ok(())
    }

    async fn list_property_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT property_id FROM wishlist_items WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list wishlist")
    }
}

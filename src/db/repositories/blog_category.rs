//! Blog category repository

use crate::db::DynDatabasePool;
use crate::models::{BlogCategory, BlogCategoryWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Blog category repository trait
#[async_trait]
pub trait BlogCategoryRepository: Send + Sync {
    async fn create(&self, category: &BlogCategory) -> Result<BlogCategory>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<BlogCategory>>;

    async fn update(&self, category: &BlogCategory) -> Result<BlogCategory>;

    /// Delete a category; its posts become uncategorized
    async fn delete(&self, id: i64) -> Result<()>;

    /// All categories by name, with published post counts
    async fn list_with_counts(&self) -> Result<Vec<BlogCategoryWithCount>>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// SQLx-based blog category repository implementation
pub struct SqlxBlogCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogCategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BlogCategoryRepository for SqlxBlogCategoryRepository {
    async fn create(&self, category: &BlogCategory) -> Result<BlogCategory> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO blog_categories (name, slug, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create blog category")?;

        Ok(BlogCategory {
            id: result.last_insert_rowid(),
            created_at: now,
            ..category.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, created_at FROM blog_categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get blog category by ID")?;

        Ok(row.as_ref().map(row_to_category))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<BlogCategory>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, created_at FROM blog_categories WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get blog category by name")?;

        Ok(row.as_ref().map(row_to_category))
    }

    async fn update(&self, category: &BlogCategory) -> Result<BlogCategory> {
        sqlx::query("UPDATE blog_categories SET name = ?, slug = ?, description = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(category.id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update blog category")?;

        self.get_by_id(category.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Blog category not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM blog_categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete blog category")?;
        Ok(())
    }

    async fn list_with_counts(&self) -> Result<Vec<BlogCategoryWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at,
                   COUNT(b.id) AS post_count
            FROM blog_categories c
            LEFT JOIN blogs b ON b.category_id = c.id AND b.status = 'published'
            GROUP BY c.id, c.name, c.slug, c.description, c.created_at
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list blog categories")?;

        Ok(rows
            .iter()
            .map(|row| BlogCategoryWithCount {
                category: row_to_category(row),
                post_count: row.get("post_count"),
            })
            .collect())
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blog_categories WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check blog category slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> BlogCategory {
    BlogCategory {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

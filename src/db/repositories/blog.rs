//! Blog repository
//!
//! Database operations for blog posts. Reads join the category and author
//! so that list pages need a single query.

use super::{contains_pattern, SqlArg};
use crate::db::DynDatabasePool;
use crate::models::{Blog, BlogCategorySummary, BlogFilter, BlogStatus, BlogWithMeta};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// Post by slug with category and author
    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogWithMeta>>;

    /// Post by ID with category and author
    async fn get_with_meta(&self, id: i64) -> Result<Option<BlogWithMeta>>;

    async fn update(&self, blog: &Blog) -> Result<Blog>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Filtered page of posts; public listings pass `published_only`
    async fn list(
        &self,
        filter: &BlogFilter,
        published_only: bool,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<BlogWithMeta>, i64)>;

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn increment_views(&self, id: i64) -> Result<()>;

    async fn count_published(&self) -> Result<i64>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

const BLOG_COLUMNS: &str = "b.id, b.slug, b.title, b.excerpt, b.content, b.content_html, \
     b.cover_image, b.category_id, b.author_id, b.tags, b.status, b.published_at, b.view_count, \
     b.created_at, b.updated_at";

const META_JOIN: &str = " FROM blogs b \
     LEFT JOIN blog_categories c ON c.id = b.category_id \
     LEFT JOIN admins a ON a.id = b.author_id";

fn select_with_meta() -> String {
    format!(
        "SELECT {}, c.name AS category_name, c.slug AS category_slug, a.name AS author_name{}",
        BLOG_COLUMNS, META_JOIN
    )
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO blogs (slug, title, excerpt, content, content_html, cover_image,
                category_id, author_id, tags, status, published_at, view_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.cover_image)
        .bind(blog.category_id)
        .bind(blog.author_id)
        .bind(serde_json::to_string(&blog.tags)?)
        .bind(blog.status.to_string())
        .bind(blog.published_at)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create blog post")?;

        Ok(Blog {
            id: result.last_insert_rowid(),
            view_count: 0,
            created_at: now,
            updated_at: now,
            ..blog.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        let row = sqlx::query(&format!("SELECT {} FROM blogs b WHERE b.id = ?", BLOG_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get blog post by ID")?;

        row.as_ref().map(row_to_blog).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<BlogWithMeta>> {
        let row = sqlx::query(&format!("{} WHERE b.slug = ?", select_with_meta()))
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get blog post by slug")?;

        row.as_ref().map(row_to_blog_with_meta).transpose()
    }

    async fn get_with_meta(&self, id: i64) -> Result<Option<BlogWithMeta>> {
        let row = sqlx::query(&format!("{} WHERE b.id = ?", select_with_meta()))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get blog post by ID")?;

        row.as_ref().map(row_to_blog_with_meta).transpose()
    }

    async fn update(&self, blog: &Blog) -> Result<Blog> {
        sqlx::query(
            r#"
            UPDATE blogs
            SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, cover_image = ?,
                category_id = ?, tags = ?, status = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&blog.slug)
        .bind(&blog.title)
        .bind(&blog.excerpt)
        .bind(&blog.content)
        .bind(&blog.content_html)
        .bind(&blog.cover_image)
        .bind(blog.category_id)
        .bind(serde_json::to_string(&blog.tags)?)
        .bind(blog.status.to_string())
        .bind(blog.published_at)
        .bind(Utc::now())
        .bind(blog.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update blog post")?;

        self.get_by_id(blog.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Blog post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete blog post")?;
        Ok(())
    }

    async fn list(
        &self,
        filter: &BlogFilter,
        published_only: bool,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<BlogWithMeta>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut args = Vec::new();

        if published_only {
            conditions.push("b.status = 'published'");
        } else if let Some(status) = filter.status {
            conditions.push("b.status = ?");
            args.push(SqlArg::Text(status.to_string()));
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            conditions.push("c.slug = ?");
            args.push(SqlArg::Text(category.to_string()));
        }
        if let Some(tag) = filter.tag.as_deref().filter(|t| !t.is_empty()) {
            conditions.push("EXISTS (SELECT 1 FROM json_each(b.tags) WHERE json_each.value = ?)");
            args.push(SqlArg::Text(tag.to_string()));
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            conditions.push("(b.title LIKE ? ESCAPE '\\' OR b.excerpt LIKE ? ESCAPE '\\')");
            let pattern = contains_pattern(q);
            args.push(SqlArg::Text(pattern.clone()));
            args.push(SqlArg::Text(pattern));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let order = if published_only {
            "b.published_at DESC, b.id DESC"
        } else {
            "b.created_at DESC, b.id DESC"
        };

        let list_sql = format!(
            "{}{} ORDER BY {} LIMIT ? OFFSET ?",
            select_with_meta(),
            where_clause,
            order
        );
        let count_sql = format!("SELECT COUNT(*) as count{}{}", META_JOIN, where_clause);

        let mut list_query = sqlx::query(&list_sql);
        let mut count_query = sqlx::query(&count_sql);
        for arg in &args {
            list_query = arg.bind_to(list_query);
            count_query = arg.bind_to(count_query);
        }

        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list blog posts")?;
        let posts = rows
            .iter()
            .map(row_to_blog_with_meta)
            .collect::<Result<Vec<_>>>()?;

        let total: i64 = count_query
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count blog posts")?
            .get("count");

        Ok((posts, total))
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blogs WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check blog slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE blogs SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to increment view count")?;
        Ok(())
    }

    async fn count_published(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM blogs WHERE status = 'published'")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count published posts")?;
        Ok(row.get("count"))
    }
}

fn row_to_blog(row: &sqlx::sqlite::SqliteRow) -> Result<Blog> {
    let status_str: String = row.get("status");
    let tags: String = row.get("tags");

    Ok(Blog {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_image: row.get("cover_image"),
        category_id: row.get("category_id"),
        author_id: row.get("author_id"),
        tags: serde_json::from_str(&tags).context("Invalid tags JSON")?,
        status: BlogStatus::from_str(&status_str)?,
        published_at: row.get("published_at"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_blog_with_meta(row: &sqlx::sqlite::SqliteRow) -> Result<BlogWithMeta> {
    let blog = row_to_blog(row)?;
    let category = match (
        blog.category_id,
        row.get::<Option<String>, _>("category_name"),
        row.get::<Option<String>, _>("category_slug"),
    ) {
        (Some(id), Some(name), Some(slug)) => Some(BlogCategorySummary { id, name, slug }),
        _ => None,
    };

    Ok(BlogWithMeta {
        blog,
        category,
        author_name: row.get("author_name"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    fn sample_blog(slug: &str, status: BlogStatus, tags: &[&str]) -> Blog {
        let now = Utc::now();
        Blog {
            id: 0,
            slug: slug.to_string(),
            title: format!("Post {}", slug),
            excerpt: Some("About land titles".to_string()),
            content: "Body".to_string(),
            content_html: "<p>Body</p>\n".to_string(),
            cover_image: None,
            category_id: None,
            author_id: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status,
            published_at: (status == BlogStatus::Published).then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup() -> (DynDatabasePool, SqlxBlogRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        (pool.clone(), SqlxBlogRepository::new(pool))
    }

    #[tokio::test]
    async fn test_create_get_and_views() {
        let (_pool, repo) = setup().await;
        let created = repo
            .create(&sample_blog("hello", BlogStatus::Published, &["news"]))
            .await
            .unwrap();

        repo.increment_views(created.id).await.unwrap();
        repo.increment_views(created.id).await.unwrap();

        let found = repo.get_by_slug("hello").await.unwrap().expect("not found");
        assert_eq!(found.blog.view_count, 2);
        assert_eq!(found.blog.tags, vec!["news".to_string()]);
        assert!(found.category.is_none());
    }

    #[tokio::test]
    async fn test_list_published_with_tag_and_category() {
        let (pool, repo) = setup().await;
        pool.execute("INSERT INTO blog_categories (id, name, slug) VALUES (1, 'Guides', 'guides')")
            .await
            .unwrap();

        let mut guide = sample_blog("guide", BlogStatus::Published, &["land", "tips"]);
        guide.category_id = Some(1);
        repo.create(&guide).await.unwrap();
        repo.create(&sample_blog("news", BlogStatus::Published, &["news"]))
            .await
            .unwrap();
        repo.create(&sample_blog("draft", BlogStatus::Draft, &["land"]))
            .await
            .unwrap();

        let (_, total) = repo.list(&BlogFilter::default(), true, 0, 10).await.unwrap();
        assert_eq!(total, 2);

        let (_, total) = repo.list(&BlogFilter::default(), false, 0, 10).await.unwrap();
        assert_eq!(total, 3);

        let by_tag = BlogFilter {
            tag: Some("land".to_string()),
            ..Default::default()
        };
        let (items, total) = repo.list(&by_tag, true, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].blog.slug, "guide");
        assert_eq!(items[0].category.as_ref().map(|c| c.slug.as_str()), Some("guides"));

        let by_category = BlogFilter {
            category: Some("guides".to_string()),
            ..Default::default()
        };
        let (_, total) = repo.list(&by_category, false, 0, 10).await.unwrap();
        assert_eq!(total, 1);

        let literal = |q: &str| BlogFilter {
            q: Some(q.to_string()),
            ..Default::default()
        };
        let (_, total) = repo.list(&literal("land"), false, 0, 10).await.unwrap();
        assert_eq!(total, 3);
        let (_, total) = repo.list(&literal("%"), false, 0, 10).await.unwrap();
        assert_eq!(total, 0);

        assert_eq!(repo.count_published().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_slug_exists_excludes_self() {
        let (_pool, repo) = setup().await;
        let post = repo
            .create(&sample_blog("hello", BlogStatus::Draft, &[]))
            .await
            .unwrap();
        assert!(repo.slug_exists("hello", None).await.unwrap());
        assert!(!repo.slug_exists("hello", Some(post.id)).await.unwrap());
    }
}

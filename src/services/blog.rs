//! Blog service
//!
//! Categories and posts. Post bodies are Markdown, rendered to HTML on
//! every save. Public reads go through the cache.

use crate::cache::{keys, CacheLayer, SharedCache};
use crate::db::repositories::{BlogCategoryRepository, BlogRepository};
use crate::models::{
    Blog, BlogCategory, BlogCategoryInput, BlogCategoryWithCount, BlogFilter, BlogStatus,
    BlogWithMeta, CreateBlogInput, ListParams, PagedResult, UpdateBlogInput,
};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::markdown::MarkdownRenderer;
use crate::services::slug::{generate_slug, slug_or, unique_slug};
use crate::services::validation::{optional, required};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Blog service
pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
    category_repo: Arc<dyn BlogCategoryRepository>,
    cache: SharedCache,
    markdown: MarkdownRenderer,
}

impl BlogService {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        category_repo: Arc<dyn BlogCategoryRepository>,
        cache: SharedCache,
    ) -> Self {
        Self {
            repo,
            category_repo,
            cache,
            markdown: MarkdownRenderer::new(),
        }
    }

    // ---- categories ----

    /// Categories with their published post counts
    pub async fn list_categories(&self) -> ServiceResult<Vec<BlogCategoryWithCount>> {
        if let Ok(Some(cached)) = self
            .cache
            .get::<Vec<BlogCategoryWithCount>>(keys::BLOG_CATEGORIES)
            .await
        {
            return Ok(cached);
        }

        let categories = self
            .category_repo
            .list_with_counts()
            .await
            .context("Failed to list categories")?;

        if let Err(e) = self
            .cache
            .set(keys::BLOG_CATEGORIES, &categories, self.cache.default_ttl())
            .await
        {
            tracing::warn!("Failed to cache blog categories: {:#}", e);
        }
        Ok(categories)
    }

    pub async fn create_category(&self, input: BlogCategoryInput) -> ServiceResult<BlogCategory> {
        let name = required(&input.name, "Name")?;
        self.ensure_category_name_free(&name, None).await?;

        let slug = self.unique_category_slug(&name, None).await?;
        let category = BlogCategory {
            id: 0,
            name,
            slug,
            description: optional(input.description),
            created_at: Utc::now(),
        };

        let created = self
            .category_repo
            .create(&category)
            .await
            .context("Failed to create category")?;
        self.invalidate_categories().await;
        Ok(created)
    }

    /// Rename a category; the slug follows the new name
    pub async fn update_category(&self, id: i64, input: BlogCategoryInput) -> ServiceResult<BlogCategory> {
        let mut category = self.get_category(id).await?;
        let name = required(&input.name, "Name")?;

        if name != category.name {
            self.ensure_category_name_free(&name, Some(id)).await?;
            category.slug = self.unique_category_slug(&name, Some(id)).await?;
            category.name = name;
        }
        category.description = optional(input.description);

        let updated = self
            .category_repo
            .update(&category)
            .await
            .context("Failed to update category")?;
        self.invalidate_categories().await;
        self.invalidate_posts().await;
        Ok(updated)
    }

    /// Delete a category; its posts become uncategorised
    pub async fn delete_category(&self, id: i64) -> ServiceResult<()> {
        self.get_category(id).await?;
        self.category_repo
            .delete(id)
            .await
            .context("Failed to delete category")?;
        self.invalidate_categories().await;
        self.invalidate_posts().await;
        Ok(())
    }

    async fn get_category(&self, id: i64) -> ServiceResult<BlogCategory> {
        self.category_repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| ServiceError::not_found("Blog category"))
    }

    async fn ensure_category_name_free(&self, name: &str, exclude: Option<i64>) -> ServiceResult<()> {
        let existing = self
            .category_repo
            .get_by_name(name)
            .await
            .context("Failed to check category name")?;
        match existing {
            Some(c) if Some(c.id) != exclude => Err(ServiceError::conflict(format!(
                "Category '{}' already exists",
                name
            ))),
            _ => Ok(()),
        }
    }

    async fn unique_category_slug(&self, name: &str, exclude: Option<i64>) -> ServiceResult<String> {
        let repo = self.category_repo.clone();
        Ok(unique_slug(&slug_or(name, "category"), |candidate| {
            let repo = repo.clone();
            async move { repo.slug_exists(&candidate, exclude).await }
        })
        .await?)
    }

    // ---- posts ----

    /// Published posts, newest first
    pub async fn list_public(&self, filter: &BlogFilter, params: &ListParams) -> ServiceResult<PagedResult<BlogWithMeta>> {
        self.list(filter, true, params).await
    }

    /// All posts for the back office
    pub async fn list_admin(&self, filter: &BlogFilter, params: &ListParams) -> ServiceResult<PagedResult<BlogWithMeta>> {
        self.list(filter, false, params).await
    }

    async fn list(
        &self,
        filter: &BlogFilter,
        published_only: bool,
        params: &ListParams,
    ) -> ServiceResult<PagedResult<BlogWithMeta>> {
        let (posts, total) = self
            .repo
            .list(filter, published_only, params.offset(), params.limit())
            .await
            .context("Failed to list posts")?;
        Ok(PagedResult::new(posts, total, params))
    }

    /// Published post by slug; each call counts as a view.
    ///
    /// The cached copy's `view_count` lags behind the stored one until it
    /// expires or the post is edited.
    pub async fn get_published_by_slug(&self, slug: &str) -> ServiceResult<BlogWithMeta> {
        let key = keys::blog_slug(slug);
        let mut post = match self.cache.get::<BlogWithMeta>(&key).await {
            Ok(Some(post)) => post,
            _ => {
                let post = self
                    .repo
                    .get_by_slug(slug)
                    .await
                    .context("Failed to get post")?
                    .filter(|p| p.blog.is_published())
                    .ok_or_else(|| ServiceError::not_found("Blog post"))?;
                if let Err(e) = self.cache.set(&key, &post, self.cache.default_ttl()).await {
                    tracing::warn!("Failed to cache post {}: {:#}", slug, e);
                }
                post
            }
        };

        self.repo
            .increment_views(post.blog.id)
            .await
            .context("Failed to count view")?;
        post.blog.view_count += 1;
        Ok(post)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<BlogWithMeta> {
        self.repo
            .get_with_meta(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| ServiceError::not_found("Blog post"))
    }

    pub async fn create(&self, author_id: i64, input: CreateBlogInput) -> ServiceResult<BlogWithMeta> {
        let title = required(&input.title, "Title")?;
        let content = required(&input.content, "Content")?;
        if let Some(category_id) = input.category_id {
            self.require_category(category_id).await?;
        }

        let base = match input.slug.as_deref() {
            Some(explicit) if !explicit.trim().is_empty() => normalized_slug(explicit)?,
            _ => slug_or(&title, "post"),
        };
        let repo = self.repo.clone();
        let slug = unique_slug(&base, |candidate| {
            let repo = repo.clone();
            async move { repo.slug_exists(&candidate, None).await }
        })
        .await?;

        let now = Utc::now();
        let blog = Blog {
            id: 0,
            slug,
            title,
            excerpt: optional(input.excerpt).or_else(|| Some(self.markdown.excerpt(&content))),
            content_html: self.markdown.render(&content),
            content,
            cover_image: optional(input.cover_image),
            category_id: input.category_id,
            author_id: Some(author_id),
            tags: clean_tags(input.tags),
            status: input.status,
            published_at: (input.status == BlogStatus::Published).then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&blog).await.context("Failed to create post")?;
        tracing::info!(post_id = created.id, slug = %created.slug, status = %created.status, "Blog post created");
        if created.is_published() {
            self.invalidate_categories().await;
        }
        self.get(created.id).await
    }

    pub async fn update(&self, id: i64, input: UpdateBlogInput) -> ServiceResult<BlogWithMeta> {
        let mut blog = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| ServiceError::not_found("Blog post"))?;
        let old_slug = blog.slug.clone();

        if let Some(slug) = input.slug.as_deref() {
            let slug = normalized_slug(slug)?;
            if slug != blog.slug {
                if self
                    .repo
                    .slug_exists(&slug, Some(id))
                    .await
                    .context("Failed to check slug")?
                {
                    return Err(ServiceError::conflict(format!("Slug '{}' is already in use", slug)));
                }
                blog.slug = slug;
            }
        }
        if let Some(title) = input.title {
            blog.title = required(&title, "Title")?;
        }
        if let Some(content) = input.content {
            blog.content = required(&content, "Content")?;
            blog.content_html = self.markdown.render(&blog.content);
        }
        if let Some(excerpt) = input.excerpt {
            blog.excerpt = optional(Some(excerpt)).or_else(|| Some(self.markdown.excerpt(&blog.content)));
        }
        if let Some(cover) = input.cover_image {
            blog.cover_image = optional(Some(cover));
        }
        if let Some(category_id) = input.category_id {
            self.require_category(category_id).await?;
            blog.category_id = Some(category_id);
        }
        if let Some(tags) = input.tags {
            blog.tags = clean_tags(tags);
        }
        if let Some(status) = input.status {
            blog.status = status;
        }
        // First publication only; later unpublish/republish keeps the date
        if blog.is_published() && blog.published_at.is_none() {
            blog.published_at = Some(Utc::now());
        }

        self.repo.update(&blog).await.context("Failed to update post")?;

        self.invalidate_post(&old_slug).await;
        if blog.slug != old_slug {
            self.invalidate_post(&blog.slug).await;
        }
        self.invalidate_categories().await;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let blog = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| ServiceError::not_found("Blog post"))?;

        self.repo.delete(id).await.context("Failed to delete post")?;
        self.invalidate_post(&blog.slug).await;
        self.invalidate_categories().await;
        tracing::info!(post_id = id, "Blog post deleted");
        Ok(())
    }

    async fn require_category(&self, id: i64) -> ServiceResult<()> {
        match self.get_category(id).await {
            Ok(_) => Ok(()),
            Err(ServiceError::NotFound(_)) => Err(ServiceError::validation("Blog category does not exist")),
            Err(e) => Err(e),
        }
    }

    async fn invalidate_post(&self, slug: &str) {
        if let Err(e) = self.cache.delete(&keys::blog_slug(slug)).await {
            tracing::warn!("Failed to invalidate post cache for {}: {:#}", slug, e);
        }
    }

    async fn invalidate_posts(&self) {
        if let Err(e) = self.cache.delete_pattern(keys::BLOG_SLUG_PATTERN).await {
            tracing::warn!("Failed to invalidate post cache: {:#}", e);
        }
    }

    async fn invalidate_categories(&self) {
        if let Err(e) = self.cache.delete(keys::BLOG_CATEGORIES).await {
            tracing::warn!("Failed to invalidate category cache: {:#}", e);
        }
    }
}

fn normalized_slug(raw: &str) -> ServiceResult<String> {
    let slug = generate_slug(raw);
    if slug.is_empty() {
        return Err(ServiceError::validation("Slug must contain letters or digits"));
    }
    Ok(slug)
}

/// Trim, drop blanks and duplicates, keep first-seen order
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{SqlxBlogCategoryRepository, SqlxBlogRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (BlogService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        pool.execute(
            "INSERT INTO admins (name, email, password_hash, role, created_at, updated_at) \
             VALUES ('Editor', 'ed@hay.test', 'h', 'admin', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .await
        .unwrap();

        let service = BlogService::new(
            SqlxBlogRepository::boxed(pool.clone()),
            SqlxBlogCategoryRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        );
        (service, 1)
    }

    fn post(title: &str, status: BlogStatus) -> CreateBlogInput {
        CreateBlogInput {
            title: title.into(),
            slug: None,
            excerpt: None,
            content: "# Heading\n\nSome **bold** advice about buying land.".into(),
            cover_image: None,
            category_id: None,
            tags: vec!["Land".into(), " land ".into(), "Tips".into(), "".into()],
            status,
        }
    }

    #[tokio::test]
    async fn test_create_renders_markdown_and_excerpt() {
        let (service, author) = setup().await;
        let created = service.create(author, post("Buying Land", BlogStatus::Draft)).await.unwrap();

        assert_eq!(created.blog.slug, "buying-land");
        assert!(created.blog.content_html.contains("<strong>bold</strong>"));
        assert_eq!(
            created.blog.excerpt.as_deref(),
            Some("Heading Some bold advice about buying land.")
        );
        assert_eq!(created.blog.tags, vec!["Land".to_string(), "Tips".to_string()]);
        assert!(created.blog.published_at.is_none());
        assert_eq!(created.author_name.as_deref(), Some("Editor"));
    }

    #[tokio::test]
    async fn test_published_at_set_on_first_publish_only() {
        let (service, author) = setup().await;
        let draft = service.create(author, post("Draft", BlogStatus::Draft)).await.unwrap();

        let published = service
            .update(draft.blog.id, UpdateBlogInput { status: Some(BlogStatus::Published), ..Default::default() })
            .await
            .unwrap();
        let first = published.blog.published_at.expect("published_at set");

        service
            .update(draft.blog.id, UpdateBlogInput { status: Some(BlogStatus::Draft), ..Default::default() })
            .await
            .unwrap();
        let again = service
            .update(draft.blog.id, UpdateBlogInput { status: Some(BlogStatus::Published), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(again.blog.published_at, Some(first));
    }

    #[tokio::test]
    async fn test_public_detail_counts_views_and_hides_drafts() {
        let (service, author) = setup().await;
        let draft = service.create(author, post("Hidden", BlogStatus::Draft)).await.unwrap();
        let live = service.create(author, post("Live", BlogStatus::Published)).await.unwrap();

        assert!(matches!(
            service.get_published_by_slug(&draft.blog.slug).await,
            Err(ServiceError::NotFound(_))
        ));

        assert_eq!(service.get_published_by_slug("live").await.unwrap().blog.view_count, 1);
        service.get_published_by_slug("live").await.unwrap();
        assert_eq!(service.get(live.blog.id).await.unwrap().blog.view_count, 2);

        let public = service.list_public(&BlogFilter::default(), &ListParams::default()).await.unwrap();
        assert_eq!(public.total, 1);
        let admin = service.list_admin(&BlogFilter::default(), &ListParams::default()).await.unwrap();
        assert_eq!(admin.total, 2);
    }

    #[tokio::test]
    async fn test_categories() {
        let (service, author) = setup().await;

        let news = service
            .create_category(BlogCategoryInput { name: "Market News".into(), description: None })
            .await
            .unwrap();
        assert_eq!(news.slug, "market-news");

        let dup = service
            .create_category(BlogCategoryInput { name: "market news".into(), description: None })
            .await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let mut input = post("Prices Rise", BlogStatus::Published);
        input.category_id = Some(news.id);
        service.create(author, input).await.unwrap();

        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].post_count, 1);

        let renamed = service
            .update_category(news.id, BlogCategoryInput { name: "Market Updates".into(), description: Some("Weekly".into()) })
            .await
            .unwrap();
        assert_eq!(renamed.slug, "market-updates");
        assert_eq!(service.list_categories().await.unwrap()[0].category.name, "Market Updates");

        let mut bad = post("Orphan", BlogStatus::Draft);
        bad.category_id = Some(999);
        assert!(matches!(service.create(author, bad).await, Err(ServiceError::Validation(_))));

        service.delete_category(news.id).await.unwrap();
        assert!(service.list_categories().await.unwrap().is_empty());
        let post = service.get_published_by_slug("prices-rise").await.unwrap();
        assert!(post.category.is_none());
    }

    #[tokio::test]
    async fn test_slug_conflict_on_update() {
        let (service, author) = setup().await;
        let a = service.create(author, post("First", BlogStatus::Draft)).await.unwrap();
        service.create(author, post("Second", BlogStatus::Draft)).await.unwrap();

        let clash = service
            .update(a.blog.id, UpdateBlogInput { slug: Some("second".into()), ..Default::default() })
            .await;
        assert!(matches!(clash, Err(ServiceError::Conflict(_))));

        let dup_title = service.create(author, post("First", BlogStatus::Draft)).await.unwrap();
        assert_eq!(dup_title.blog.slug, "first-2");
    }

    #[test]
    fn test_clean_tags() {
        assert_eq!(
            clean_tags(vec![" a ".into(), "A".into(), "".into(), "b".into()]),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}

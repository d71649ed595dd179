//! Blog models
//!
//! Posts are written in Markdown by admins and rendered to HTML on save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    /// Markdown source
    pub content: String,
    /// Rendered HTML
    pub content_html: String,
    pub cover_image: Option<String>,
    pub category_id: Option<i64>,
    /// Authoring admin
    pub author_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: BlogStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn is_published(&self) -> bool {
        self.status == BlogStatus::Published
    }
}

/// Blog post status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlogStatus::Draft => write!(f, "draft"),
            BlogStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for BlogStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(BlogStatus::Draft),
            "published" => Ok(BlogStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid blog status: {}", s)),
        }
    }
}

/// Blog post joined with its category and author names, as shown to readers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogWithMeta {
    #[serde(flatten)]
    pub blog: Blog,
    pub category: Option<BlogCategorySummary>,
    pub author_name: Option<String>,
}

/// Category reference embedded in a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogCategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Blog category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Category with the number of published posts in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogCategoryWithCount {
    #[serde(flatten)]
    pub category: BlogCategory,
    pub post_count: i64,
}

/// Input for creating a blog post
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: BlogStatus,
}

/// Input for updating a blog post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBlogInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub status: Option<BlogStatus>,
}

/// Filters for blog listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogFilter {
    /// Category slug
    pub category: Option<String>,
    pub tag: Option<String>,
    /// Substring match on title or excerpt
    pub q: Option<String>,
    pub status: Option<BlogStatus>,
}

/// Input for creating or updating a blog category
#[derive(Debug, Clone, Deserialize)]
pub struct BlogCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_status() {
        assert_eq!(BlogStatus::default(), BlogStatus::Draft);
        assert_eq!(BlogStatus::from_str("Published").unwrap(), BlogStatus::Published);
        assert!(BlogStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_create_input_defaults_to_draft() {
        let input: CreateBlogInput = serde_json::from_value(serde_json::json!({
            "title": "Buying land in Lekki",
            "content": "# Hello"
        }))
        .unwrap();
        assert_eq!(input.status, BlogStatus::Draft);
        assert!(input.tags.is_empty());
    }

    #[test]
    fn test_blog_with_meta_flattens() {
        let now = Utc::now();
        let blog = Blog {
            id: 1,
            slug: "hello".into(),
            title: "Hello".into(),
            excerpt: None,
            content: "hi".into(),
            content_html: "<p>hi</p>\n".into(),
            cover_image: None,
            category_id: None,
            author_id: None,
            tags: vec!["news".into()],
            status: BlogStatus::Published,
            published_at: Some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(BlogWithMeta {
            blog,
            category: None,
            author_name: Some("Root".into()),
        })
        .unwrap();

        assert_eq!(value["slug"], "hello");
        assert_eq!(value["status"], "published");
        assert_eq!(value["author_name"], "Root");
    }
}

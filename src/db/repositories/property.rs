//! Property repository
//!
//! Database operations for listings. `features` and `images` are stored as
//! JSON arrays in TEXT columns.

use super::{contains_pattern, SqlArg};
use crate::db::DynDatabasePool;
use crate::models::{Property, PropertyFilter, PropertyStatus, PropertyType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Property repository trait
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: &Property) -> Result<Property>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Property>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Property>>;

    async fn update(&self, property: &Property) -> Result<Property>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Filtered, sorted page of properties and the total match count
    async fn list(&self, filter: &PropertyFilter, offset: i64, limit: i64) -> Result<(Vec<Property>, i64)>;

    /// Check whether a slug is taken, optionally ignoring one property
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn set_status(&self, id: i64, status: PropertyStatus) -> Result<()>;

    /// Number of properties per status
    async fn count_by_status(&self) -> Result<Vec<(PropertyStatus, i64)>>;
}

/// SQLx-based property repository implementation
pub struct SqlxPropertyRepository {
    pool: DynDatabasePool,
}

impl SqlxPropertyRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PropertyRepository> {
        Arc::new(Self::new(pool))
    }
}

const PROPERTY_COLUMNS: &str = "id, slug, title, description, location, city, price, property_type, \
     status, bedrooms, bathrooms, size_sqm, features, images, is_featured, is_published, \
     created_at, updated_at";

fn build_where(filter: &PropertyFilter) -> (String, Vec<SqlArg>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut args = Vec::new();

    if filter.published_only {
        conditions.push("is_published = 1");
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        conditions.push(
            "(title LIKE ? ESCAPE '\\' OR location LIKE ? ESCAPE '\\' OR city LIKE ? ESCAPE '\\')",
        );
        let pattern = contains_pattern(q);
        for _ in 0..3 {
            args.push(SqlArg::Text(pattern.clone()));
        }
    }
    if let Some(t) = filter.property_type {
        conditions.push("property_type = ?");
        args.push(SqlArg::Text(t.to_string()));
    }
    if let Some(s) = filter.status {
        conditions.push("status = ?");
        args.push(SqlArg::Text(s.to_string()));
    }
    if let Some(city) = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        conditions.push("city = ? COLLATE NOCASE");
        args.push(SqlArg::Text(city.to_string()));
    }
    if let Some(min) = filter.min_price {
        conditions.push("price >= ?");
        args.push(SqlArg::Int(min));
    }
    if let Some(max) = filter.max_price {
        conditions.push("price <= ?");
        args.push(SqlArg::Int(max));
    }
    if let Some(beds) = filter.bedrooms {
        conditions.push("bedrooms >= ?");
        args.push(SqlArg::Int(beds as i64));
    }
    if let Some(featured) = filter.featured {
        conditions.push("is_featured = ?");
        args.push(SqlArg::Int(featured as i64));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (where_clause, args)
}

#[async_trait]
impl PropertyRepository for SqlxPropertyRepository {
    async fn create(&self, property: &Property) -> Result<Property> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO properties (slug, title, description, location, city, price, property_type,
                status, bedrooms, bathrooms, size_sqm, features, images, is_featured, is_published,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&property.slug)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.location)
        .bind(&property.city)
        .bind(property.price)
        .bind(property.property_type.to_string())
        .bind(property.status.to_string())
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.size_sqm)
        .bind(serde_json::to_string(&property.features)?)
        .bind(serde_json::to_string(&property.images)?)
        .bind(property.is_featured)
        .bind(property.is_published)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create property")?;

        Ok(Property {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..property.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Property>> {
        let row = sqlx::query(&format!("SELECT {} FROM properties WHERE id = ?", PROPERTY_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get property by ID")?;

        row.as_ref().map(row_to_property).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Property>> {
        let row = sqlx::query(&format!("SELECT {} FROM properties WHERE slug = ?", PROPERTY_COLUMNS))
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get property by slug")?;

        row.as_ref().map(row_to_property).transpose()
    }

    async fn update(&self, property: &Property) -> Result<Property> {
        sqlx::query(
            r#"
            UPDATE properties
            SET slug = ?, title = ?, description = ?, location = ?, city = ?, price = ?,
                property_type = ?, status = ?, bedrooms = ?, bathrooms = ?, size_sqm = ?,
                features = ?, images = ?, is_featured = ?, is_published = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&property.slug)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.location)
        .bind(&property.city)
        .bind(property.price)
        .bind(property.property_type.to_string())
        .bind(property.status.to_string())
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.size_sqm)
        .bind(serde_json::to_string(&property.features)?)
        .bind(serde_json::to_string(&property.images)?)
        .bind(property.is_featured)
        .bind(property.is_published)
        .bind(Utc::now())
        .bind(property.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update property")?;

        self.get_by_id(property.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Property not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete property")?;
        Ok(())
    }

    async fn list(&self, filter: &PropertyFilter, offset: i64, limit: i64) -> Result<(Vec<Property>, i64)> {
        let (where_clause, args) = build_where(filter);

        let list_sql = format!(
            "SELECT {} FROM properties{} ORDER BY {} LIMIT ? OFFSET ?",
            PROPERTY_COLUMNS,
            where_clause,
            filter.sort.order_by()
        );
        let count_sql = format!("SELECT COUNT(*) as count FROM properties{}", where_clause);

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
            .context("Failed to list properties")?;
        let properties = rows.iter().map(row_to_property).collect::<Result<Vec<_>>>()?;

        let total: i64 = count_query
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count properties")?
            .get("count");

        Ok((properties, total))
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM properties WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check property slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn set_status(&self, id: i64, status: PropertyStatus) -> Result<()> {
        sqlx::query("UPDATE properties SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to set property status")?;
        Ok(())
    }

    async fn count_by_status(&self) -> Result<Vec<(PropertyStatus, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) as count FROM properties GROUP BY status")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to count properties by status")?;

        let mut counts = Vec::new();
        for row in rows {
            let status: String = row.get("status");
            counts.push((PropertyStatus::from_str(&status)?, row.get("count")));
        }
        Ok(counts)
    }
}

fn row_to_property(row: &sqlx::sqlite::SqliteRow) -> Result<Property> {
    let type_str: String = row.get("property_type");
    let status_str: String = row.get("status");
    let features: String = row.get("features");
    let images: String = row.get("images");

    Ok(Property {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        city: row.get("city"),
        price: row.get("price"),
        property_type: PropertyType::from_str(&type_str)?,
        status: PropertyStatus::from_str(&status_str)?,
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        size_sqm: row.get("size_sqm"),
        features: serde_json::from_str(&features).context("Invalid features JSON")?,
        images: serde_json::from_str(&images).context("Invalid images JSON")?,
        is_featured: row.get("is_featured"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::PropertySort;

    pub(crate) fn sample_property(slug: &str, price: i64) -> Property {
        let now = Utc::now();
        Property {
            id: 0,
            slug: slug.to_string(),
            title: format!("Property {}", slug),
            description: "Spacious".to_string(),
            location: "Admiralty Way".to_string(),
            city: "Lagos".to_string(),
            price,
            property_type: PropertyType::Duplex,
            status: PropertyStatus::Available,
            bedrooms: Some(4),
            bathrooms: Some(3),
            size_sqm: Some(320.0),
            features: vec!["Pool".to_string()],
            images: vec!["/uploads/a.jpg".to_string()],
            is_featured: false,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup_test_repo() -> SqlxPropertyRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxPropertyRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrips_json_columns() {
        let repo = setup_test_repo().await;
        let created = repo.create(&sample_property("villa", 100)).await.unwrap();

        let found = repo.get_by_slug("villa").await.unwrap().expect("not found");
        assert_eq!(found.id, created.id);
        assert_eq!(found.features, vec!["Pool".to_string()]);
        assert_eq!(found.cover_image(), Some("/uploads/a.jpg"));
        assert_eq!(found.property_type, PropertyType::Duplex);
    }

    #[tokio::test]
    async fn test_slug_exists() {
        let repo = setup_test_repo().await;
        let created = repo.create(&sample_property("villa", 100)).await.unwrap();

        assert!(repo.slug_exists("villa", None).await.unwrap());
        assert!(!repo.slug_exists("villa", Some(created.id)).await.unwrap());
        assert!(!repo.slug_exists("cottage", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_sort() {
        let repo = setup_test_repo().await;
        repo.create(&sample_property("a", 300)).await.unwrap();
        repo.create(&sample_property("b", 100)).await.unwrap();
        let mut hidden = sample_property("c", 200);
        hidden.is_published = false;
        repo.create(&hidden).await.unwrap();

        let filter = PropertyFilter {
            published_only: true,
            sort: PropertySort::PriceAsc,
            ..Default::default()
        };
        let (items, total) = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].slug, "b");

        let filter = PropertyFilter {
            min_price: Some(150),
            max_price: Some(250),
            ..Default::default()
        };
        let (items, total) = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].slug, "c");

        let filter = PropertyFilter {
            q: Some("admiralty".to_string()),
            city: Some("lagos".to_string()),
            ..Default::default()
        };
        let (_, total) = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = setup_test_repo().await;
        repo.create(&sample_property("plain", 100)).await.unwrap();
        let mut offer = sample_property("offer", 200);
        offer.title = "Duplex 10% off".to_string();
        repo.create(&offer).await.unwrap();

        let search = |q: &str| PropertyFilter {
            q: Some(q.to_string()),
            ..Default::default()
        };
        let (items, total) = repo.list(&search("%"), 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].slug, "offer");

        let (_, total) = repo.list(&search("_"), 0, 10).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_status_counts() {
        let repo = setup_test_repo().await;
        let a = repo.create(&sample_property("a", 1)).await.unwrap();
        repo.create(&sample_property("b", 1)).await.unwrap();
        repo.set_status(a.id, PropertyStatus::Sold).await.unwrap();

        let counts = repo.count_by_status().await.unwrap();
        assert!(counts.contains(&(PropertyStatus::Sold, 1)));
        assert!(counts.contains(&(PropertyStatus::Available, 1)));
    }
}

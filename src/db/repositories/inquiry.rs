//! Inquiry repository

use crate::db::DynDatabasePool;
use crate::models::{Inquiry, InquiryStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Inquiry repository trait
#[async_trait]
pub trait InquiryRepository: Send + Sync {
    async fn create(&self, inquiry: &Inquiry) -> Result<Inquiry>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Inquiry>>;

    /// Newest first, optionally by status
    async fn list(&self, status: Option<InquiryStatus>, offset: i64, limit: i64) -> Result<(Vec<Inquiry>, i64)>;

    async fn set_status(&self, id: i64, status: InquiryStatus) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn count_by_status(&self, status: InquiryStatus) -> Result<i64>;
}

/// SQLx-based inquiry repository implementation
pub struct SqlxInquiryRepository {
    pool: DynDatabasePool,
}

impl SqlxInquiryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InquiryRepository> {
        Arc::new(Self::new(pool))
    }
}

const INQUIRY_COLUMNS: &str = "id, property_id, name, email, phone, message, status, created_at";

#[async_trait]
impl InquiryRepository for SqlxInquiryRepository {
    async fn create(&self, inquiry: &Inquiry) -> Result<Inquiry> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO inquiries (property_id, name, email, phone, message, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(inquiry.property_id)
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.phone)
        .bind(&inquiry.message)
        .bind(inquiry.status.to_string())
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create inquiry")?;

        Ok(Inquiry {
            id: result.last_insert_rowid(),
            created_at: now,
            ..inquiry.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Inquiry>> {
        let row = sqlx::query(&format!("SELECT {} FROM inquiries WHERE id = ?", INQUIRY_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get inquiry by ID")?;

        row.as_ref().map(row_to_inquiry).transpose()
    }

    async fn list(&self, status: Option<InquiryStatus>, offset: i64, limit: i64) -> Result<(Vec<Inquiry>, i64)> {
        let where_clause = if status.is_some() { " WHERE status = ?" } else { "" };

        let list_sql = format!(
            "SELECT {} FROM inquiries{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            INQUIRY_COLUMNS, where_clause
        );
        let count_sql = format!("SELECT COUNT(*) as count FROM inquiries{}", where_clause);

        let mut list_query = sqlx::query(&list_sql);
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = status {
            list_query = list_query.bind(status.to_string());
            count_query = count_query.bind(status.to_string());
        }

        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list inquiries")?;
        let inquiries = rows.iter().map(row_to_inquiry).collect::<Result<Vec<_>>>()?;

        let total: i64 = count_query
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count inquiries")?
            .get("count");

        Ok((inquiries, total))
    }

    async fn set_status(&self, id: i64, status: InquiryStatus) -> Result<()> {
        sqlx::query("UPDATE inquiries SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update inquiry status")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM inquiries WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete inquiry")?;
        Ok(())
    }

    async fn count_by_status(&self, status: InquiryStatus) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM inquiries WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count inquiries")?;
        Ok(row.get("count"))
    }
}

fn row_to_inquiry(row: &sqlx::sqlite::SqliteRow) -> Result<Inquiry> {
    let status_str: String = row.get("status");
    Ok(Inquiry {
        id: row.get("id"),
        property_id: row.get("property_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        message: row.get("message"),
        status: InquiryStatus::from_str(&status_str)?,
        created_at: row.get("created_at"),
    })
}

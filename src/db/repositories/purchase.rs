//! Purchase repository
//!
//! Each development phase is its own INTEGER column so the flags stay
//! queryable.

use super::SqlArg;
use crate::db::DynDatabasePool;
use crate::models::{PhaseFlags, Purchase, PurchaseFilter, PurchaseStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Purchase repository trait
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn create(&self, purchase: &Purchase) -> Result<Purchase>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Purchase>>;

    async fn update(&self, purchase: &Purchase) -> Result<Purchase>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Filtered page, newest first
    async fn list(&self, filter: &PurchaseFilter, offset: i64, limit: i64) -> Result<(Vec<Purchase>, i64)>;

    /// All purchases of one user, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>>;

    /// Pending or in-progress purchases of a property, other than `exclude_id`
    async fn count_active_for_property(&self, property_id: i64, exclude_id: Option<i64>) -> Result<i64>;

    /// Completed purchases of the property, optionally ignoring one purchase
    async fn count_completed_for_property(&self, property_id: i64, exclude_id: Option<i64>) -> Result<i64>;

    /// Any purchase referencing the property
    async fn count_for_property(&self, property_id: i64) -> Result<i64>;

    async fn count_by_status(&self) -> Result<Vec<(PurchaseStatus, i64)>>;
}

/// SQLx-based purchase repository implementation
pub struct SqlxPurchaseRepository {
    pool: DynDatabasePool,
}

impl SqlxPurchaseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PurchaseRepository> {
        Arc::new(Self::new(pool))
    }
}

const PURCHASE_COLUMNS: &str = "id, user_id, property_id, total_amount, amount_paid, status, \
     land_acquisition, documentation, foundation, blockwork, roofing, mep, finishing, handover, \
     notes, created_at, updated_at";

#[async_trait]
impl PurchaseRepository for SqlxPurchaseRepository {
    async fn create(&self, purchase: &Purchase) -> Result<Purchase> {
        let now = Utc::now();
        let p = &purchase.phases;

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, property_id, total_amount, amount_paid, status,
                land_acquisition, documentation, foundation, blockwork, roofing, mep, finishing,
                handover, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(purchase.user_id)
        .bind(purchase.property_id)
        .bind(purchase.total_amount)
        .bind(purchase.amount_paid)
        .bind(purchase.status.to_string())
        .bind(p.land_acquisition)
        .bind(p.documentation)
        .bind(p.foundation)
        .bind(p.blockwork)
        .bind(p.roofing)
        .bind(p.mep)
        .bind(p.finishing)
        .bind(p.handover)
        .bind(&purchase.notes)
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create purchase")?;

        Ok(Purchase {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..purchase.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Purchase>> {
        let row = sqlx::query(&format!("SELECT {} FROM purchases WHERE id = ?", PURCHASE_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get purchase by ID")?;

        row.as_ref().map(row_to_purchase).transpose()
    }

    async fn update(&self, purchase: &Purchase) -> Result<Purchase> {
        let p = &purchase.phases;

        sqlx::query(
            r#"
            UPDATE purchases
            SET total_amount = ?, amount_paid = ?, status = ?,
                land_acquisition = ?, documentation = ?, foundation = ?, blockwork = ?,
                roofing = ?, mep = ?, finishing = ?, handover = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(purchase.total_amount)
        .bind(purchase.amount_paid)
        .bind(purchase.status.to_string())
        .bind(p.land_acquisition)
        .bind(p.documentation)
        .bind(p.foundation)
        .bind(p.blockwork)
        .bind(p.roofing)
        .bind(p.mep)
        .bind(p.finishing)
        .bind(p.handover)
        .bind(&purchase.notes)
        .bind(Utc::now())
        .bind(purchase.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update purchase")?;

        self.get_by_id(purchase.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Purchase not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM purchases WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete purchase")?;
        Ok(())
    }

    async fn list(&self, filter: &PurchaseFilter, offset: i64, limit: i64) -> Result<(Vec<Purchase>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut args = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            args.push(SqlArg::Text(status.to_string()));
        }
        if let Some(user_id) = filter.user_id {
            conditions.push("user_id = ?");
            args.push(SqlArg::Int(user_id));
        }
        if let Some(property_id) = filter.property_id {
            conditions.push("property_id = ?");
            args.push(SqlArg::Int(property_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT {} FROM purchases{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            PURCHASE_COLUMNS, where_clause
        );
        let count_sql = format!("SELECT COUNT(*) as count FROM purchases{}", where_clause);

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
            .context("Failed to list purchases")?;
        let purchases = rows.iter().map(row_to_purchase).collect::<Result<Vec<_>>>()?;

        let total: i64 = count_query
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count purchases")?
            .get("count");

        Ok((purchases, total))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Purchase>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM purchases WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            PURCHASE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list user purchases")?;

        rows.iter().map(row_to_purchase).collect()
    }

    async fn count_active_for_property(&self, property_id: i64, exclude_id: Option<i64>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM purchases
            WHERE property_id = ? AND id != ? AND status IN ('pending', 'in_progress')
            "#,
        )
        .bind(property_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count active purchases")?;
        Ok(row.get("count"))
    }

    async fn count_completed_for_property(&self, property_id: i64, exclude_id: Option<i64>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM purchases WHERE property_id = ? AND id != ? AND status = 'completed'",
        )
        .bind(property_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count completed purchases")?;
        Ok(row.get("count"))
    }

    async fn count_for_property(&self, property_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM purchases WHERE property_id = ?")
            .bind(property_id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count property purchases")?;
        Ok(row.get("count"))
    }

    async fn count_by_status(&self) -> Result<Vec<(PurchaseStatus, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) as count FROM purchases GROUP BY status")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to count purchases by status")?;

        let mut counts = Vec::new();
        for row in rows {
            let status: String = row.get("status");
            counts.push((PurchaseStatus::from_str(&status)?, row.get("count")));
        }
        Ok(counts)
    }
}

fn row_to_purchase(row: &sqlx::sqlite::SqliteRow) -> Result<Purchase> {
    let status_str: String = row.get("status");

    Ok(Purchase {
        id: row.get("id"),
        user_id: row.get("user_id"),
        property_id: row.get("property_id"),
        total_amount: row.get("total_amount"),
        amount_paid: row.get("amount_paid"),
        status: PurchaseStatus::from_str(&status_str)?,
        phases: PhaseFlags {
            land_acquisition: row.get("land_acquisition"),
            documentation: row.get("documentation"),
            foundation: row.get("foundation"),
            blockwork: row.get("blockwork"),
            roofing: row.get("roofing"),
            mep: row.get("mep"),
            finishing: row.get("finishing"),
            handover: row.get("handover"),
        },
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

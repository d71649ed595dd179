//! Admin repository
//!
//! Database operations for back-office accounts.

use crate::db::DynDatabasePool;
use crate::models::{Admin, AdminRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;

    /// All admins, oldest first
    async fn list(&self) -> Result<Vec<Admin>>;

    async fn count(&self) -> Result<i64>;

    /// Record a successful login
    async fn touch_last_login(&self, id: i64) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based admin repository implementation
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

const ADMIN_COLUMNS: &str =
    "id, name, email, password_hash, role, last_login_at, created_at, updated_at";

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO admins (name, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role.to_string())
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create admin")?;

        Ok(Admin {
            id: result.last_insert_rowid(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
            ..admin.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get admin by ID")?;

        row.as_ref().map(row_to_admin).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {} FROM admins WHERE email = ?", ADMIN_COLUMNS))
            .bind(email)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get admin by email")?;

        row.as_ref().map(row_to_admin).transpose()
    }

    async fn list(&self) -> Result<Vec<Admin>> {
        let rows = sqlx::query(&format!("SELECT {} FROM admins ORDER BY id", ADMIN_COLUMNS))
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list admins")?;

        rows.iter().map(row_to_admin).collect()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM admins")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count admins")?;
        Ok(row.get("count"))
    }

    async fn touch_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE admins SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to record admin login")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM admins WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete admin")?;
        Ok(())
    }
}

fn row_to_admin(row: &sqlx::sqlite::SqliteRow) -> Result<Admin> {
    let role_str: String = row.get("role");
    let role = AdminRole::from_str(&role_str)
        .with_context(|| format!("Invalid admin role in database: {}", role_str))?;

    Ok(Admin {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxAdminRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxAdminRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_login_touch() {
        let repo = setup_test_repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);

        let admin = repo
            .create(&Admin::new("Root".into(), "root@hay.test".into(), "h".into(), AdminRole::SuperAdmin))
            .await
            .expect("Failed to create admin");
        assert!(admin.id > 0);
        assert!(admin.last_login_at.is_none());

        repo.touch_last_login(admin.id).await.unwrap();
        let reloaded = repo.get_by_email("root@hay.test").await.unwrap().unwrap();
        assert!(reloaded.last_login_at.is_some());
        assert!(reloaded.is_super_admin());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = setup_test_repo().await;
        let a = repo
            .create(&Admin::new("A".into(), "a@hay.test".into(), "h".into(), AdminRole::SuperAdmin))
            .await
            .unwrap();
        let b = repo
            .create(&Admin::new("B".into(), "b@hay.test".into(), "h".into(), AdminRole::Admin))
            .await
            .unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, a.id);

        repo.delete(b.id).await.unwrap();
        assert!(repo.get_by_id(b.id).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}

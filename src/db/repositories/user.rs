//! User repository
//!
//! Database operations for site users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait over SQLite

use super::contains_pattern;
use crate::db::DynDatabasePool;
use crate::models::{User, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email (expects a lowercased address)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update name, phone, avatar, status and password hash
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user (cascades to wishlist, purchases and reset tokens)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count all users
    async fn count(&self) -> Result<i64>;

    /// List users, newest first, optionally matching name/email/phone
    async fn list(&self, search: Option<&str>, offset: i64, limit: i64) -> Result<(Vec<User>, i64)>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

const USER_COLUMNS: &str =
    "id, name, email, phone, password_hash, avatar, status, created_at, updated_at";

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, password_hash, avatar, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.status.to_string())
        .bind(now)
        .bind(now)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get user by ID")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get user by email")?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, phone = ?, avatar = ?, status = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.avatar)
        .bind(user.status.to_string())
        .bind(&user.password_hash)
        .bind(Utc::now())
        .bind(user.id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update user")?;

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete user")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count users")?;
        Ok(row.get("count"))
    }

    async fn list(&self, search: Option<&str>, offset: i64, limit: i64) -> Result<(Vec<User>, i64)> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let where_clause = if pattern.is_some() {
            " WHERE name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\' OR phone LIKE ? ESCAPE '\\'"
        } else {
            ""
        };

        let list_sql = format!(
            "SELECT {} FROM users{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS, where_clause
        );
        let count_sql = format!("SELECT COUNT(*) as count FROM users{}", where_clause);

        let mut list_query = sqlx::query(&list_sql);
        let mut count_query = sqlx::query(&count_sql);
        if let Some(ref pattern) = pattern {
            for _ in 0..3 {
                list_query = list_query.bind(pattern);
                count_query = count_query.bind(pattern);
            }
        }

        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list users")?;

        let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;

        let total: i64 = count_query
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count users")?
            .get("count");

        Ok((users, total))
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .with_context(|| format!("Invalid user status in database: {}", status_str))?;

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        avatar: row.get("avatar"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxUserRepository::new(pool)
    }

    fn test_user(name: &str, email: &str) -> User {
        User::new(name.to_string(), email.to_string(), "hash".to_string(), None)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&test_user("Ada", "ada@example.com"))
            .await
            .expect("Failed to create user");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(found.status, UserStatus::Active);

        let by_email = repo.get_by_email("ada@example.com").await.unwrap();
        assert!(by_email.is_some());
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let repo = setup_test_repo().await;
        repo.create(&test_user("A", "same@example.com")).await.unwrap();
        let result = repo.create(&test_user("B", "same@example.com")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_update_user() {
        let repo = setup_test_repo().await;
        let mut user = repo.create(&test_user("Ada", "ada@example.com")).await.unwrap();

        user.name = "Ada L.".to_string();
        user.phone = Some("0800".to_string());
        user.status = UserStatus::Suspended;
        let updated = repo.update(&user).await.expect("Failed to update");

        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.phone.as_deref(), Some("0800"));
        assert!(updated.is_suspended());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = setup_test_repo().await;
        let user = repo.create(&test_user("Ada", "ada@example.com")).await.unwrap();
        repo.delete(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let repo = setup_test_repo().await;
        for i in 0..5 {
            repo.create(&test_user(&format!("User {}", i), &format!("u{}@example.com", i)))
                .await
                .unwrap();
        }
        repo.create(&test_user("Grace", "grace@navy.mil")).await.unwrap();

        let (page, total) = repo.list(None, 0, 4).await.unwrap();
        assert_eq!(total, 6);
        assert_eq!(page.len(), 4);

        let (found, total) = repo.list(Some("navy"), 0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].name, "Grace");

        // Wildcards match only themselves
        let (_, total) = repo.list(Some("%"), 0, 10).await.unwrap();
        assert_eq!(total, 0);
        let (_, total) = repo.list(Some("u_@"), 0, 10).await.unwrap();
        assert_eq!(total, 0);

        assert_eq!(repo.count().await.unwrap(), 6);
    }
}

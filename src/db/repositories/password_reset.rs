//! Password reset token repository

use crate::db::DynDatabasePool;
use crate::models::PasswordResetToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Password reset token repository trait
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken>;

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>>;

    /// Mark a token used; returns false if it was already used
    async fn mark_used(&self, id: i64) -> Result<bool>;

    /// Mark every unused token of a user as used
    async fn invalidate_for_user(&self, user_id: i64) -> Result<u64>;

    /// Remove expired tokens
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based password reset repository implementation
pub struct SqlxPasswordResetRepository {
    pool: DynDatabasePool,
}

impl SqlxPasswordResetRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PasswordResetRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PasswordResetRepository for SqlxPasswordResetRepository {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken> {
        let result = sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create password reset token")?;

        Ok(PasswordResetToken {
            id: result.last_insert_rowid(),
            ..token.clone()
        })
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get password reset token")?;

        Ok(row.map(|row| PasswordResetToken {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            used_at: row.get("used_at"),
            created_at: row.get("created_at"),
        }))
    }

    async fn mark_used(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to mark reset token used")?;
        Ok(result.rows_affected() == 1)
    }

    async fn invalidate_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ? WHERE user_id = ? AND used_at IS NULL",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to invalidate reset tokens")?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete expired reset tokens")?;
        Ok(result.rows_affected())
    }
}

//! Admin back office service
//!
//! Admin authentication, the startup bootstrap of the first super admin,
//! admin management and user management.

use crate::config::AdminBootstrapConfig;
use crate::db::repositories::{AdminRepository, UserRepository};
use crate::models::{Admin, AdminRole, ListParams, PagedResult, UpdateUserInput, User};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::purchase::PurchaseService;
use crate::services::password::{hash_password, validate_password, verify_password};
use crate::services::validation::{normalize_email, optional, required};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;

/// Input for creating an admin account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdminInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: AdminRole,
}

/// Admin service
pub struct AdminService {
    admin_repo: Arc<dyn AdminRepository>,
    user_repo: Arc<dyn UserRepository>,
    purchases: Arc<PurchaseService>,
}

impl AdminService {
    pub fn new(
        admin_repo: Arc<dyn AdminRepository>,
        user_repo: Arc<dyn UserRepository>,
        purchases: Arc<PurchaseService>,
    ) -> Self {
        Self {
            admin_repo,
            user_repo,
            purchases,
        }
    }

    /// Check admin credentials and record the login time
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<Admin> {
        let email = email.trim().to_lowercase();
        let admin = self
            .admin_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up admin")?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".into()))?;

        if !verify_password(password, &admin.password_hash).context("Failed to verify password")? {
            return Err(ServiceError::Unauthorized("Invalid email or password".into()));
        }

        self.admin_repo
            .touch_last_login(admin.id)
            .await
            .context("Failed to record login")?;
        tracing::info!(admin_id = admin.id, "Admin logged in");

        self.get_admin(admin.id).await
    }

    /// Create the first super admin from configuration.
    ///
    /// Does nothing when any admin already exists or when the bootstrap
    /// credentials are incomplete. Returns the created admin, if any.
    pub async fn bootstrap(&self, config: &AdminBootstrapConfig) -> ServiceResult<Option<Admin>> {
        if self.admin_repo.count().await.context("Failed to count admins")? > 0 {
            return Ok(None);
        }

        let (email, password) = match (config.email.as_deref(), config.password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => {
                tracing::warn!("No admin account exists and no bootstrap credentials are configured");
                return Ok(None);
            }
        };

        let admin = self
            .create_admin(CreateAdminInput {
                name: config.name.clone().unwrap_or_else(|| "Administrator".to_string()),
                email: email.to_string(),
                password: password.to_string(),
                role: AdminRole::SuperAdmin,
            })
            .await?;

        tracing::info!(admin_id = admin.id, email = %admin.email, "Bootstrapped super admin");
        Ok(Some(admin))
    }

    pub async fn get_admin(&self, id: i64) -> ServiceResult<Admin> {
        self.admin_repo
            .get_by_id(id)
            .await
            .context("Failed to get admin")?
            .ok_or_else(|| ServiceError::not_found("Admin"))
    }

    pub async fn list_admins(&self) -> ServiceResult<Vec<Admin>> {
        Ok(self.admin_repo.list().await.context("Failed to list admins")?)
    }

    pub async fn create_admin(&self, input: CreateAdminInput) -> ServiceResult<Admin> {
        let name = required(&input.name, "Name")?;
        let email = normalize_email(&input.email)?;
        validate_password(&input.password).map_err(ServiceError::Validation)?;

        if self
            .admin_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(ServiceError::conflict("An admin with this email already exists"));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let admin = Admin::new(name, email, password_hash, input.role);
        Ok(self.admin_repo.create(&admin).await.context("Failed to create admin")?)
    }

    /// Delete another admin; an admin cannot delete themselves
    pub async fn delete_admin(&self, actor_id: i64, id: i64) -> ServiceResult<()> {
        if actor_id == id {
            return Err(ServiceError::validation("You cannot delete your own account"));
        }
        self.get_admin(id).await?;
        self.admin_repo.delete(id).await.context("Failed to delete admin")?;
        tracing::info!(admin_id = id, by = actor_id, "Admin deleted");
        Ok(())
    }

    /// Page of users, optionally filtered by a search term
    pub async fn list_users(&self, search: Option<&str>, params: &ListParams) -> ServiceResult<PagedResult<User>> {
        let (users, total) = self
            .user_repo
            .list(search, params.offset(), params.limit())
            .await
            .context("Failed to list users")?;
        Ok(PagedResult::new(users, total, params))
    }

    pub async fn get_user(&self, id: i64) -> ServiceResult<User> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    pub async fn update_user(&self, id: i64, input: UpdateUserInput) -> ServiceResult<User> {
        let mut user = self.get_user(id).await?;

        if let Some(name) = input.name {
            user.name = required(&name, "Name")?;
        }
        if let Some(phone) = input.phone {
            user.phone = optional(Some(phone));
        }
        if let Some(status) = input.status {
            if status != user.status {
                tracing::info!(user_id = id, %status, "User status changed");
            }
            user.status = status;
        }

        Ok(self.user_repo.update(&user).await.context("Failed to update user")?)
    }

    /// Delete a customer account.
    ///
    /// The buyer's purchases go first so the properties they held are
    /// released instead of being dropped by the cascade.
    pub async fn delete_user(&self, id: i64) -> ServiceResult<()> {
        self.get_user(id).await?;
        let removed = self.purchases.remove_for_user(id).await?;
        self.user_repo.delete(id).await.context("Failed to delete user")?;
        tracing::info!(user_id = id, purchases = removed, "User deleted");
        Ok(())
    }
}

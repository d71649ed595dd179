//! User account service
//!
//! Registration, login, profile management and the password reset flow.
//! Session tokens are issued by the API layer once a login succeeds.

use crate::db::repositories::{PasswordResetRepository, UserRepository};
use crate::models::{PasswordResetToken, User};
use crate::services::email::EmailService;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::{hash_password, validate_password, verify_password};
use crate::services::validation::{normalize_email, optional, required};
use anyhow::Context;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Input for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Profile fields a user may change; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// User service
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    reset_repo: Arc<dyn PasswordResetRepository>,
    email: Arc<EmailService>,
    public_url: String,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        reset_repo: Arc<dyn PasswordResetRepository>,
        email: Arc<EmailService>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repo,
            reset_repo,
            email,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Register a new account
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<User> {
        let name = required(&input.name, "Name")?;
        let email = normalize_email(&input.email)?;
        validate_password(&input.password).map_err(ServiceError::Validation)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(ServiceError::conflict("An account with this email already exists"));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(name, email, password_hash, optional(input.phone));
        let user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = user.id, "User registered");

        if let Err(e) = self.email.send_welcome(&user.email, &user.name).await {
            tracing::warn!(user_id = user.id, "Failed to send welcome mail: {:#}", e);
        }

        Ok(user)
    }

    /// Check credentials and return the user
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid email or password".into()))?;

        if !verify_password(password, &user.password_hash).context("Failed to verify password")? {
            return Err(ServiceError::Unauthorized("Invalid email or password".into()));
        }

        if user.is_suspended() {
            return Err(ServiceError::Forbidden("This account has been suspended".into()));
        }

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> ServiceResult<User> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Update name, phone or avatar
    pub async fn update_profile(&self, id: i64, input: UpdateProfileInput) -> ServiceResult<User> {
        let mut user = self.get_by_id(id).await?;

        if let Some(name) = input.name {
            user.name = required(&name, "Name")?;
        }
        if let Some(phone) = input.phone {
            user.phone = optional(Some(phone));
        }
        if let Some(avatar) = input.avatar {
            user.avatar = optional(Some(avatar));
        }

        Ok(self.user_repo.update(&user).await.context("Failed to update user")?)
    }

    /// Store a newly uploaded avatar URL
    pub async fn set_avatar(&self, id: i64, url: String) -> ServiceResult<User> {
        let mut user = self.get_by_id(id).await?;
        user.avatar = Some(url);
        Ok(self.user_repo.update(&user).await.context("Failed to update avatar")?)
    }

    /// Change the password after checking the current one
    pub async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let mut user = self.get_by_id(id).await?;

        if !verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?
        {
            return Err(ServiceError::validation("Current password is incorrect"));
        }
        validate_password(new_password).map_err(ServiceError::Validation)?;

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo.update(&user).await.context("Failed to update password")?;
        tracing::info!(user_id = id, "Password changed");
        Ok(())
    }

    /// Start a password reset.
    ///
    /// Succeeds whether or not the address belongs to an account. When it
    /// does, older unused tokens are invalidated and a link is mailed. The
    /// raw token is returned for that case so callers can test the flow;
    /// the API never exposes it.
    pub async fn request_password_reset(&self, email: &str) -> ServiceResult<Option<String>> {
        let email = email.trim().to_lowercase();
        let user = match self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
        {
            Some(user) => user,
            None => {
                tracing::debug!("Password reset requested for unknown address");
                return Ok(None);
            }
        };

        self.reset_repo
            .invalidate_for_user(user.id)
            .await
            .context("Failed to invalidate reset tokens")?;

        let raw = generate_reset_token();
        self.reset_repo
            .create(&PasswordResetToken::new(user.id, hash_token(&raw)))
            .await
            .context("Failed to store reset token")?;

        let link = format!("{}/reset-password?token={}", self.public_url, raw);
        if let Err(e) = self.email.send_password_reset(&user.email, &user.name, &link).await {
            tracing::error!(user_id = user.id, "Failed to send password reset mail: {:#}", e);
        }

        Ok(Some(raw))
    }

    /// Finish a password reset with the mailed token
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ServiceResult<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::validation("Reset token is required"));
        }
        validate_password(new_password).map_err(ServiceError::Validation)?;

        let stored = self
            .reset_repo
            .get_by_hash(&hash_token(token))
            .await
            .context("Failed to look up reset token")?
            .filter(PasswordResetToken::is_usable)
            .ok_or_else(|| ServiceError::validation("Invalid or expired reset token"))?;

        // Lose the race rather than reuse a token
        if !self
            .reset_repo
            .mark_used(stored.id)
            .await
            .context("Failed to consume reset token")?
        {
            return Err(ServiceError::validation("Invalid or expired reset token"));
        }

        let mut user = self.get_by_id(stored.user_id).await?;
        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo.update(&user).await.context("Failed to update password")?;

        tracing::info!(user_id = user.id, "Password reset completed");
        Ok(())
    }
}

fn generate_reset_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Hex SHA-256 of a raw reset token
pub fn hash_token(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

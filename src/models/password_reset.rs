//! Password reset token model
//!
//! Only the SHA-256 hash of a token is stored; the raw token goes out by
//! email and is never persisted.

use chrono::{DateTime, Duration, Utc};

/// Lifetime of a reset token
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Stored password reset token
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    /// Hex SHA-256 of the raw token
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn new(user_id: i64, token_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            token_hash,
            expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            used_at: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Unused and not expired
    pub fn is_usable(&self) -> bool {
        self.used_at.is_none() && !self.is_expired()
    }
}

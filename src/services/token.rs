//! Session tokens
//!
//! Sessions are HS256 JWTs carried in a cookie (or a bearer header). The
//! `kind` claim keeps user and admin sessions apart: a token of one kind is
//! never accepted where the other is required.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    User,
    Admin,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::User => write!(f, "user"),
            SessionKind::Admin => write!(f, "admin"),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or admin ID)
    pub sub: i64,
    pub kind: SessionKind,
    /// Admin role, or "user"
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies session tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, session_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::days(session_days.max(1)),
        }
    }

    /// Session lifetime in seconds, used for the cookie Max-Age
    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Sign a token for a subject
    pub fn issue(&self, subject: i64, kind: SessionKind, role: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            kind,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature and expiry and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Verify and additionally require a session kind
    pub fn verify_kind(&self, token: &str, kind: SessionKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            return Err(TokenError::Invalid(format!(
                "expected a {} session, got {}",
                kind, claims.kind
            )));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key", 7)
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = service();
        let token = svc.issue(42, SessionKind::User, "user").unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.kind, SessionKind::User);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let svc = service();
        let user_token = svc.issue(1, SessionKind::User, "user").unwrap();
        let admin_token = svc.issue(1, SessionKind::Admin, "super_admin").unwrap();

        assert!(svc.verify_kind(&user_token, SessionKind::Admin).is_err());
        assert!(svc.verify_kind(&admin_token, SessionKind::User).is_err());
        assert!(svc.verify_kind(&admin_token, SessionKind::Admin).is_ok());
    }

    #[test]
    fn test_tampered_and_foreign_tokens_rejected() {
        let svc = service();
        let token = svc.issue(1, SessionKind::User, "user").unwrap();

        // Graft another subject's payload onto this signature
        let other_subject = svc.issue(2, SessionKind::User, "user").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other_subject.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert!(matches!(svc.verify(&tampered), Err(TokenError::Invalid(_))));

        let other = TokenService::new("another-secret", 7);
        assert!(other.verify(&token).is_err());
        assert!(svc.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let now = Utc::now().timestamp();
        let token = svc
            .encode_claims(&Claims {
                sub: 1,
                kind: SessionKind::User,
                role: "user".into(),
                iat: now - 3600,
                exp: now - 10,
            })
            .unwrap();

        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }
}

//! Service error type
//!
//! Every service returns `ServiceError`; the API layer maps each variant to
//! a status code and error code.

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Entity does not exist (or is not visible to the caller)
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// Unique constraint or state conflict
    #[error("{0}")]
    Conflict(String),

    /// Missing or wrong credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

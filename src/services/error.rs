use thiserror::Error;

use crate::database::DatabaseError;

/// Errors shared by the catalog services.
///
/// `Validation`, `NotFound` and `Conflict` are deterministic business
/// failures the caller can act on; `Database` wraps transient store errors,
/// which propagate unchanged (no retries happen at this layer).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database manager error: {0}")]
    Manager(#[from] DatabaseError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `what` names the missing thing, e.g. "Category" or "Price record".
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Postgres unique-constraint violation (duplicate key).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|db| db.code()),
        Some(code) if code == "23505"
    )
}

/// Postgres foreign-key violation (referenced row missing).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|db| db.code()),
        Some(code) if code == "23503"
    )
}

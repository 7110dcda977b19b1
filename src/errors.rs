use sea_orm::error::DbErr;
use thiserror::Error;

/// Errors surfaced by the admin services.
///
/// There is a single tier: anything unexpected propagates to the binary's
/// `main`, which logs it and exits non-zero. The scripts rely on re-run
/// idempotence instead of in-run recovery.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ServiceError::PasswordHash(err.to_string())
    }
}

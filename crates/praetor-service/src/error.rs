use thiserror::Error;

use crate::auth::policy::PolicyError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    PolicyError(#[from] PolicyError),

    #[error(transparent)]
    DatabaseError(#[from] praetor_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] praetor_core::error::CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

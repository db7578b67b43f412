//! # Service Errors
//!
//! What managers return: a broken booking rule or a storage failure.

use stayhub_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

use crate::error::DbError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(e) => e.kind(),
            ServiceError::Db(e) => e.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Db(e) if e.is_retryable())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

use storekit_db::DbError;
use thiserror::Error;

/// Domain-level errors for the accounts service.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Account not found: {id}")]
    AccountNotFound { id: String },

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Storage error: {0}")]
    Storage(#[source] DbError),
}

impl DomainError {
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::AccountNotFound { id: id.into() }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<DbError> for DomainError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Validation(q) => Self::InvalidQuery(q.to_string()),
            other => Self::Storage(other),
        }
    }
}

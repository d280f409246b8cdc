//! Store error types.

use desa_core::budget::BudgetError;
use desa_shared::AppError;
use thiserror::Error;

/// Document store and budget store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller is not privileged; nothing was written.
    #[error("Permission denied: saving budgets requires admin privilege")]
    PermissionDenied,

    /// The remote store rejected or failed the operation.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// A document could not be encoded or decoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document key cannot be used as a storage path.
    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    /// Backend could not be built from configuration.
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// Budget tree error.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

impl StoreError {
    /// Create a persistence error.
    #[must_use]
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied => Self::Forbidden(err.to_string()),
            StoreError::Persistence(_) | StoreError::Serialization(_) => {
                Self::Persistence(err.to_string())
            }
            StoreError::InvalidKey(_) => Self::Validation(err.to_string()),
            StoreError::Configuration(_) => Self::Internal(err.to_string()),
            StoreError::Budget(inner) => inner.into(),
        }
    }
}

//! Error types shared by the attribute and metrics stores

use thiserror::Error;

use crate::application::ports::StorageError;
use crate::domain::errors::DomainError;

/// Error type for blob attribute load/store operations
#[derive(Debug, Error)]
pub enum AttributesError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No attributes to store for {0}")]
    Unset(String),
}

/// Error type for blob store metrics operations
#[derive(Debug, Error)]
pub enum MetricsStoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Metrics store already started")]
    AlreadyStarted,

    #[error("Do not initialize twice: {0} already set")]
    AlreadyInitialized(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid container name: {0:?}")]
    InvalidContainer(String),
}

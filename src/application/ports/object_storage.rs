use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {operation} {target}")]
    UnexpectedStatus {
        operation: &'static str,
        target: String,
        status: u16,
    },

    #[error("Malformed object {name}: {reason}")]
    Malformed { name: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectSummary {
    pub name: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl ObjectSummary {
    pub fn new(name: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            bytes,
            hash: None,
            last_modified: None,
        }
    }
}

/// Port for the Swift account operations the blob store relies on.
///
/// Only HTTP 404 (or its equivalent) maps to absence: `exists` returns
/// `Ok(false)` and the other calls return `StorageError::NotFound`. Every
/// other failure is reported as an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create the container if it does not exist yet
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError>;

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError>;

    async fn get(&self, container: &str, name: &str) -> Result<Bytes, StorageError>;

    /// Create or overwrite an object
    async fn put(&self, container: &str, name: &str, body: Bytes) -> Result<(), StorageError>;

    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError>;

    /// Objects directly under `prefix`, not descending past `delimiter`.
    /// Pseudo-directory entries are not returned.
    async fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> Result<Vec<ObjectSummary>, StorageError>;
}

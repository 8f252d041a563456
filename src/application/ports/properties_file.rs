use async_trait::async_trait;

use crate::application::ports::StorageError;
use crate::domain::value_objects::Properties;

/// A properties resource persisted as a single addressed object.
///
/// Holds the in-memory [`Properties`]; `load` replaces them with the
/// persisted content and `store` writes them out.
#[async_trait]
pub trait PropertiesFile: Send + Sync + std::fmt::Display {
    fn properties(&self) -> &Properties;

    fn properties_mut(&mut self) -> &mut Properties;

    async fn exists(&self) -> Result<bool, StorageError>;

    /// Fails with `StorageError::NotFound` when the object is absent and
    /// `StorageError::Malformed` when its content cannot be parsed.
    async fn load(&mut self) -> Result<(), StorageError>;

    async fn store(&self) -> Result<(), StorageError>;

    async fn remove(&self) -> Result<(), StorageError>;
}

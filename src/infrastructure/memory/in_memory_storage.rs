use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::trace;

use crate::application::ports::{ObjectStorage, ObjectSummary, StorageError};

/// Object storage held in process memory.
///
/// Behaves like a Swift account as far as the blob store can observe:
/// operations on a missing container or object report `NotFound`, and
/// directory listings only return objects directly under the prefix.
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    containers: DashMap<String, BTreeMap<String, Bytes>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage with `container` already created
    pub fn with_container(container: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.containers.insert(container.into(), BTreeMap::new());
        storage
    }

    /// Names of every object in `container`, sorted
    pub fn object_names(&self, container: &str) -> Vec<String> {
        self.containers
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn missing_container(container: &str) -> StorageError {
        StorageError::NotFound(container.to_string())
    }

    fn missing_object(container: &str, name: &str) -> StorageError {
        StorageError::NotFound(format!("{}/{}", container, name))
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError> {
        self.containers.entry(container.to_string()).or_default();
        Ok(())
    }

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        Ok(self
            .containers
            .get(container)
            .map(|objects| objects.contains_key(name))
            .unwrap_or(false))
    }

    async fn get(&self, container: &str, name: &str) -> Result<Bytes, StorageError> {
        let objects = self
            .containers
            .get(container)
            .ok_or_else(|| Self::missing_container(container))?;
        objects
            .get(name)
            .cloned()
            .ok_or_else(|| Self::missing_object(container, name))
    }

    async fn put(&self, container: &str, name: &str, body: Bytes) -> Result<(), StorageError> {
        let mut objects = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::missing_container(container))?;
        trace!("PUT {}/{} ({} bytes)", container, name, body.len());
        objects.insert(name.to_string(), body);
        Ok(())
    }

    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError> {
        let mut objects = self
            .containers
            .get_mut(container)
            .ok_or_else(|| Self::missing_container(container))?;
        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::missing_object(container, name))
    }

    async fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let objects = self
            .containers
            .get(container)
            .ok_or_else(|| Self::missing_container(container))?;

        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(name, _)| !name[prefix.len()..].contains(delimiter))
            .map(|(name, body)| ObjectSummary::new(name.clone(), body.len() as u64))
            .collect())
    }
}

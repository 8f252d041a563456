use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use crate::application::ports::{ObjectStorage, PropertiesFile, StorageError};
use crate::domain::value_objects::Properties;

use super::Directory;

/// A properties resource stored as one Swift object, addressed by
/// container, optional directory and key.
pub struct SwiftPropertiesFile {
    storage: Arc<dyn ObjectStorage>,
    container: String,
    directory: Option<Directory>,
    key: String,
    properties: Properties,
}

impl SwiftPropertiesFile {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        container: impl Into<String>,
        directory: Option<Directory>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            container: container.into(),
            directory,
            key: key.into(),
            properties: Properties::new(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn directory(&self) -> Option<&Directory> {
        self.directory.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `{directory}/{key}`, or just the key without a directory
    pub fn object_name(&self) -> String {
        match &self.directory {
            Some(directory) => directory.child(&self.key),
            None => self.key.clone(),
        }
    }
}

impl fmt::Display for SwiftPropertiesFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swift://{}/{}", self.container, self.object_name())
    }
}

impl fmt::Debug for SwiftPropertiesFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftPropertiesFile")
            .field("container", &self.container)
            .field("object", &self.object_name())
            .field("properties", &self.properties)
            .finish()
    }
}

#[async_trait]
impl PropertiesFile for SwiftPropertiesFile {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    async fn exists(&self) -> Result<bool, StorageError> {
        self.storage
            .exists(&self.container, &self.object_name())
            .await
    }

    async fn load(&mut self) -> Result<(), StorageError> {
        let name = self.object_name();
        debug!("Loading {}", self);

        let body = self.storage.get(&self.container, &name).await?;
        let text = std::str::from_utf8(&body).map_err(|e| StorageError::Malformed {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        self.properties = Properties::parse(text).map_err(|e| StorageError::Malformed {
            name,
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn store(&self) -> Result<(), StorageError> {
        debug!("Storing {}", self);
        let body = Bytes::from(self.properties.render(Utc::now()));
        self.storage
            .put(&self.container, &self.object_name(), body)
            .await
    }

    async fn remove(&self) -> Result<(), StorageError> {
        debug!("Removing {}", self);
        self.storage
            .delete(&self.container, &self.object_name())
            .await
    }
}

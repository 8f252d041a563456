use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::errors::AttributesError;
use crate::application::ports::ObjectStorage;
use crate::application::BlobAttributesSupport;
use crate::domain::entities::{BlobAttributes, BlobMetrics};
use crate::domain::value_objects::BlobId;

use super::{BlobPathBuilder, SwiftPropertiesFile};

/// Attributes of one blob, persisted as a properties object in a Swift
/// container. Each call performs its Swift round trips directly; nothing is
/// cached between calls.
pub struct SwiftBlobAttributes {
    support: BlobAttributesSupport<SwiftPropertiesFile>,
}

impl SwiftBlobAttributes {
    /// Attributes at `key`, not yet loaded
    pub fn new(storage: Arc<dyn ObjectStorage>, container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            support: BlobAttributesSupport::new(SwiftPropertiesFile::new(storage, container, None, key)),
        }
    }

    /// Fresh attributes at `key`, ready to be stored
    pub fn with_attributes(
        storage: Arc<dyn ObjectStorage>,
        container: impl Into<String>,
        key: impl Into<String>,
        headers: BTreeMap<String, String>,
        metrics: BlobMetrics,
    ) -> Self {
        Self {
            support: BlobAttributesSupport::with_attributes(
                SwiftPropertiesFile::new(storage, container, None, key),
                BlobAttributes::new(headers, metrics),
            ),
        }
    }

    /// Attributes of `blob_id` at its standard location
    pub fn for_blob(storage: Arc<dyn ObjectStorage>, container: impl Into<String>, blob_id: &BlobId) -> Self {
        Self::new(storage, container, BlobPathBuilder::default().attributes_path(blob_id))
    }

    /// `Ok(false)` when no attributes object exists
    pub async fn load(&mut self) -> Result<bool, AttributesError> {
        self.support.load().await
    }

    pub async fn store(&mut self) -> Result<(), AttributesError> {
        self.support.store().await
    }

    pub fn attributes(&self) -> Option<&BlobAttributes> {
        self.support.attributes()
    }

    pub fn mark_deleted(&mut self, reason: impl Into<String>) -> Result<(), AttributesError> {
        self.record_mut()?.mark_deleted(reason);
        Ok(())
    }

    pub fn undelete(&mut self) -> Result<(), AttributesError> {
        self.record_mut()?.undelete();
        Ok(())
    }

    /// Replace the record with a copy of `other`
    pub fn update_from(&mut self, other: &BlobAttributes) {
        match self.support.attributes_mut() {
            Some(record) => record.update_from(other),
            None => self.support.set_attributes(other.clone()),
        }
    }

    pub fn properties_file(&self) -> &SwiftPropertiesFile {
        self.support.file()
    }

    fn record_mut(&mut self) -> Result<&mut BlobAttributes, AttributesError> {
        let name = self.support.file().to_string();
        self.support
            .attributes_mut()
            .ok_or(AttributesError::Unset(name))
    }
}

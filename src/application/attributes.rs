use tracing::{debug, trace};

use crate::application::errors::AttributesError;
use crate::application::ports::{PropertiesFile, StorageError};
use crate::domain::entities::BlobAttributes;

/// Binds a [`BlobAttributes`] record to the properties resource it is
/// persisted in.
pub struct BlobAttributesSupport<P: PropertiesFile> {
    file: P,
    attributes: Option<BlobAttributes>,
}

impl<P: PropertiesFile> BlobAttributesSupport<P> {
    /// Support with no record yet; call [`load`](Self::load) to read one.
    pub fn new(file: P) -> Self {
        Self {
            file,
            attributes: None,
        }
    }

    pub fn with_attributes(file: P, attributes: BlobAttributes) -> Self {
        Self {
            file,
            attributes: Some(attributes),
        }
    }

    /// Returns `false`, leaving the record unset, when nothing is persisted.
    pub async fn load(&mut self) -> Result<bool, AttributesError> {
        if !self.file.exists().await? {
            debug!("Attributes file {} not found", self.file);
            return Ok(false);
        }

        self.file.load().await?;
        let attributes =
            BlobAttributes::read_from(self.file.properties()).map_err(|e| StorageError::Malformed {
                name: self.file.to_string(),
                reason: e.to_string(),
            })?;
        trace!("Loaded attributes from {}", self.file);
        self.attributes = Some(attributes);
        Ok(true)
    }

    pub async fn store(&mut self) -> Result<(), AttributesError> {
        let attributes = self
            .attributes
            .as_ref()
            .ok_or_else(|| AttributesError::Unset(self.file.to_string()))?;

        attributes.write_to(self.file.properties_mut());
        self.file.store().await?;
        trace!("Stored attributes to {}", self.file);
        Ok(())
    }

    pub fn attributes(&self) -> Option<&BlobAttributes> {
        self.attributes.as_ref()
    }

    pub fn attributes_mut(&mut self) -> Option<&mut BlobAttributes> {
        self.attributes.as_mut()
    }

    pub fn set_attributes(&mut self, attributes: BlobAttributes) {
        self.attributes = Some(attributes);
    }

    pub fn file(&self) -> &P {
        &self.file
    }
}

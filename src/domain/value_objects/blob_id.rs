use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Identifier of a blob inside a blob store.
///
/// Freshly created blobs get a random UUID; ids read back from storage are
/// accepted as long as they form a single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(String);

impl BlobId {
    const MAX_LENGTH: usize = 255;

    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidBlobId(
                "Blob ID cannot be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidBlobId(format!(
                "Blob ID too long: {} > {}",
                value.len(),
                Self::MAX_LENGTH
            )));
        }

        if value == "." || value == ".." {
            return Err(DomainError::InvalidBlobId(format!(
                "Blob ID cannot be `{}`",
                value
            )));
        }

        if value
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(DomainError::InvalidBlobId(
                "Blob ID must not contain path separators or control characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BlobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl TryFrom<String> for BlobId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(value)
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_blob_id_new_creates_unique_ids() {
        let id1 = BlobId::new();
        let id2 = BlobId::new();

        assert_ne!(id1, id2, "New BlobIds should be unique");
    }

    #[test]
    fn test_blob_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let blob_id = BlobId::from_uuid(uuid);
        assert_eq!(blob_id.as_str(), uuid.to_string());
    }

    #[test]
    fn test_blob_id_accepts_non_uuid_segment() {
        let blob_id = BlobId::from_str("path$maven-central$org.jar").unwrap();
        assert_eq!(blob_id.to_string(), "path$maven-central$org.jar");
    }

    #[test]
    fn test_blob_id_rejects_empty() {
        let err = BlobId::from_str("").unwrap_err();
        assert!(matches!(err, DomainError::InvalidBlobId(_)));
    }

    #[test]
    fn test_blob_id_rejects_separators() {
        assert!(BlobId::from_str("a/b").is_err());
        assert!(BlobId::from_str("a\\b").is_err());
        assert!(BlobId::from_str("..").is_err());
        assert!(BlobId::from_str("a\nb").is_err());
    }

    #[test]
    fn test_blob_id_rejects_too_long() {
        let err = BlobId::from_string("a".repeat(256)).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}

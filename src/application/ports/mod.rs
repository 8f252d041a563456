mod object_storage;
mod properties_file;
mod quota_service;

pub use object_storage::{ObjectStorage, ObjectSummary, StorageError};
pub use properties_file::PropertiesFile;
pub use quota_service::{BlobStoreQuotaService, QuotaResult};

#[cfg(test)]
pub use object_storage::MockObjectStorage;
#[cfg(test)]
pub use quota_service::MockBlobStoreQuotaService;

mod blob_attributes;
mod blob_store_metrics;

pub use blob_attributes::{
    BlobAttributes, BlobMetrics, CONTENT_SIZE_ATTRIBUTE, CREATION_TIME_ATTRIBUTE,
    DEFAULT_DELETED_REASON, DELETED_ATTRIBUTE, DELETED_DATETIME_ATTRIBUTE,
    DELETED_REASON_ATTRIBUTE, HEADER_PREFIX, SHA1_HASH_ATTRIBUTE,
};
pub use blob_store_metrics::{BlobStoreMetrics, BLOB_COUNT_PROP_NAME, TOTAL_SIZE_PROP_NAME};

pub mod attributes;
pub mod errors;
pub mod metrics;
pub mod ports;
pub mod quota;
pub mod scheduler;

pub use attributes::BlobAttributesSupport;
pub use quota::SpaceUsedQuota;

mod auth;
mod blob_attributes;
mod client;
mod directory;
mod metrics_store;
mod path_builder;
mod properties_file;

pub use auth::{AuthMethod, AuthSession, SwiftCredentials};
pub use blob_attributes::SwiftBlobAttributes;
pub use client::SwiftClient;
pub use directory::Directory;
pub use metrics_store::{
    SwiftBlobStoreMetricsStore, SwiftBlobStoreMetricsStoreBuilder, METRICS_DIRECTORY,
    METRICS_EXTENSION, SWIFT_FILE_STORE,
};
pub use path_builder::BlobPathBuilder;
pub use properties_file::SwiftPropertiesFile;

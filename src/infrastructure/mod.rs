pub mod memory;
pub mod swift;

pub use memory::InMemoryObjectStorage;
pub use swift::{
    AuthMethod, BlobPathBuilder, Directory, SwiftBlobAttributes, SwiftBlobStoreMetricsStore,
    SwiftClient, SwiftCredentials, SwiftPropertiesFile,
};

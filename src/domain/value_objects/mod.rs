mod blob_id;
mod node_id;
mod properties;
mod sha1_hash;

pub use blob_id::BlobId;
pub use node_id::NodeId;
pub use properties::Properties;
pub use sha1_hash::Sha1Hash;

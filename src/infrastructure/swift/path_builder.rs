use sha2::{Digest, Sha256};

use crate::domain::value_objects::BlobId;

const VOLUMES: u32 = 43;
const CHAPTERS: u32 = 47;

pub const CONTENT_PREFIX: &str = "content";
pub const ATTRIBUTES_EXTENSION: &str = ".properties";
pub const BYTES_EXTENSION: &str = ".bytes";

/// Generates object names for blob content: `content/vol-NN/chap-MM/{id}`.
///
/// The volume and chapter are taken from the SHA-256 of the blob id, so every
/// process agrees on where a blob lives.
#[derive(Debug, Clone)]
pub struct BlobPathBuilder {
    content_prefix: String,
}

impl Default for BlobPathBuilder {
    fn default() -> Self {
        Self::new(CONTENT_PREFIX)
    }
}

impl BlobPathBuilder {
    pub fn new(content_prefix: impl Into<String>) -> Self {
        Self {
            content_prefix: content_prefix.into(),
        }
    }

    /// Object name of the blob's attributes resource
    pub fn attributes_path(&self, blob_id: &BlobId) -> String {
        format!("{}{}", self.blob_path(blob_id), ATTRIBUTES_EXTENSION)
    }

    /// Object name of the blob's content
    pub fn bytes_path(&self, blob_id: &BlobId) -> String {
        format!("{}{}", self.blob_path(blob_id), BYTES_EXTENSION)
    }

    fn blob_path(&self, blob_id: &BlobId) -> String {
        let (volume, chapter) = volume_and_chapter(blob_id);
        format!(
            "{}/vol-{:02}/chap-{:02}/{}",
            self.content_prefix,
            volume,
            chapter,
            blob_id.as_str()
        )
    }
}

fn volume_and_chapter(blob_id: &BlobId) -> (u32, u32) {
    let digest = Sha256::digest(blob_id.as_str().as_bytes());
    let volume = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let chapter = u32::from_be_bytes([digest[4], digest[5], digest[6], digest[7]]);
    (volume % VOLUMES + 1, chapter % CHAPTERS + 1)
}

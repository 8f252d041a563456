use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid blob ID: {0}")]
    InvalidBlobId(String),

    #[error("Invalid node ID: {0}")]
    InvalidNodeId(String),

    #[error("Invalid SHA-1 hash: {0}")]
    InvalidSha1Hash(String),

    #[error("Malformed properties at line {line}: {reason}")]
    MalformedProperties { line: usize, reason: String },

    #[error("Invalid value for attribute `{key}`: {reason}")]
    InvalidAttribute { key: String, reason: String },

    #[error("Missing required attribute `{0}`")]
    MissingAttribute(String),
}

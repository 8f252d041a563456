use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Identity of one node in a cluster sharing a blob store.
///
/// Used verbatim in the node's metrics object name, so it is restricted to
/// characters that are safe in a Swift object name segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    const MAX_LENGTH: usize = 128;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::InvalidNodeId(
                "Node ID cannot be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidNodeId(format!(
                "Node ID too long: {} > {}",
                value.len(),
                Self::MAX_LENGTH
            )));
        }

        // Must be alphanumeric with dots/underscores/hyphens
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(DomainError::InvalidNodeId(
                "Node ID must be alphanumeric with dots/underscores/hyphens".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

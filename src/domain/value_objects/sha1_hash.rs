use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// SHA-1 content checksum (20 bytes = 40 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha1Hash(String);

impl Default for Sha1Hash {
    fn default() -> Self {
        // zero-hash is an unlikely but valid placeholder
        Self("0".repeat(40))
    }
}

impl Sha1Hash {
    /// Create from validated hex string
    pub fn from_hex(hex: String) -> Result<Self, DomainError> {
        if hex.len() != 40 {
            return Err(DomainError::InvalidSha1Hash(format!(
                "expected 40 hex characters, got {}",
                hex.len()
            )));
        }

        let mut digest = [0u8; 20];
        if hex::decode_to_slice(&hex, &mut digest).is_err() {
            return Err(DomainError::InvalidSha1Hash(format!("non-hex digits in {:?}", hex)));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get hex string representation
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Sha1Hash {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.to_string())
    }
}

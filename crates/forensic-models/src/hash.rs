//! Content hash identity type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a [`ContentHash`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentHashError {
    #[error("content hash too short: {0} chars (minimum 32)")]
    TooShort(usize),

    #[error("content hash contains non-hex character: {0:?}")]
    NotHex(char),
}

/// Deterministic digest of image bytes, used as the dedup/cache key.
///
/// Stored and transported as a lowercase hex string (128 bits / 32 hex
/// chars minimum). Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Minimum accepted digest width in hex characters (128 bits).
    pub const MIN_HEX_LEN: usize = 32;

    /// Parse and validate a hex digest string.
    pub fn parse(s: &str) -> Result<Self, ContentHashError> {
        if s.len() < Self::MIN_HEX_LEN {
            return Err(ContentHashError::TooShort(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ContentHashError::NotHex(c));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Access the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = ContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

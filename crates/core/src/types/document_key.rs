//! Opaque document keys.
//!
//! The document store addresses every record by a key it assigns on insert.
//! Keys are UUIDs and are never derived from, or compared with, the numeric
//! id carried inside the document.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a string is not a valid document key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid document key: {0}")]
pub struct DocumentKeyError(String);

/// Store-assigned identifier of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(Uuid);

impl DocumentKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentKey {
    type Err = DocumentKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DocumentKeyError(s.to_owned()))
    }
}

impl From<Uuid> for DocumentKey {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

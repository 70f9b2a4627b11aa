// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

const DOCUMENT_ID_LEN: usize = 24;

/// Identifier of a stored document.
///
/// Textually compatible with a Mongo ObjectId: 24 lowercase hex characters,
/// the first 8 of which encode the creation second.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_document_id(&value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::from_parts(secs as u32, rand::thread_rng().next_u64())
    }

    #[must_use]
    pub fn from_parts(timestamp_secs: u32, entropy: u64) -> Self {
        let mut raw = [0_u8; 12];
        raw[..4].copy_from_slice(&timestamp_secs.to_be_bytes());
        raw[4..].copy_from_slice(&entropy.to_be_bytes());
        Self(hex::encode(raw))
    }

    /// Creation second encoded in the leading four bytes.
    #[must_use]
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_str_radix(&self.0[..8], 16).unwrap_or(0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_document_id(value: &str) -> Result<()> {
    if value.len() != DOCUMENT_ID_LEN {
        return Err(Error::InvalidIdentifier {
            kind: "document_id",
            value: value.to_owned(),
            reason: "must be exactly 24 characters",
        });
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidIdentifier {
            kind: "document_id",
            value: value.to_owned(),
            reason: "must contain only hex digits",
        });
    }
    Ok(())
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl FromStr for DocumentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

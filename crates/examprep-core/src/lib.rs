#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

pub mod canonical;
mod errors;
mod ids;

pub use errors::{Error, Result};
pub use ids::DocumentId;

pub const CRATE_NAME: &str = "examprep-core";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

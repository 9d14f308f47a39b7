//! SHA-256 digests for artifact verification.
//!
//! [`Sha256Digest`] validates a 64-character hex string; either case is
//! accepted and the value is stored lowercase so comparisons are
//! case-insensitive. [`compute_sha256`] streams a file through the hasher.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::runtime::Runtime;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Why a string is not a SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    #[error("expected 64 hex characters, got {0}")]
    Length(usize),

    #[error("non-hex character '{0}'")]
    NonHex(char),
}

/// A validated, lowercase hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest of an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> std::result::Result<Self, DigestError> {
        let value = value.trim();
        let len = value.chars().count();
        if len != DIGEST_HEX_LEN {
            return Err(DigestError::Length(len));
        }
        if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(bad));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> std::result::Result<Self, DigestError> {
        Self::try_from(value.as_str())
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the SHA-256 digest of a file without loading it into memory.
#[tracing::instrument(skip(runtime))]
pub fn compute_sha256<R: Runtime>(runtime: &R, path: &Path) -> Result<Sha256Digest> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open {:?} for hashing", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut total: u64 = 0;
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {:?} for hashing", path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }
    debug!("Hashed {} bytes from {:?}", total, path);
    Ok(Sha256Digest(format!("{:x}", hasher.finalize())))
}

//! Error taxonomy for the install workflow.
//!
//! Each variant names the step that failed. None of them are retried.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one step of the resolve → locate → install pipeline.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The host OS/architecture has no published artifact.
    #[error("unsupported platform {os}/{arch}; supported platforms: {supported}")]
    UnsupportedPlatform {
        os: String,
        arch: String,
        supported: String,
    },

    /// A `--platform` value that is neither a platform key nor a target triple.
    #[error("unknown platform {key}; supported platforms: {supported}")]
    UnknownPlatformKey { key: String, supported: String },

    /// The release table has no entry for a resolved platform.
    #[error("release {version} has no artifact for platform {platform}")]
    ArtifactNotFound { version: String, platform: String },

    /// Network failure, non-2xx status or timeout while fetching.
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    /// The verified archive does not have the expected layout.
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// A file could not be written into the destination prefix.
    #[error("failed to place {path}: {reason}")]
    Placement { path: PathBuf, reason: String },

    /// The release descriptor could not be read or parsed.
    #[error("invalid release descriptor: {0}")]
    Descriptor(String),
}

/// Checksum problems. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    Mismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// The published checksum is not a SHA-256 digest at all.
    #[error("published checksum for {platform} is not a SHA-256 digest: {reason}")]
    InvalidDigest { platform: String, reason: String },

    #[error("could not hash downloaded file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, InstallError>;

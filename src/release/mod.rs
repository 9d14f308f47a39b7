//! Release descriptors.
//!
//! A [`Release`] is the immutable, per-version table of platform archives
//! and their published checksums. It is loaded once per run, either from the
//! descriptor compiled into the binary or from a JSON file.

mod locator;

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{InstallError, Result};
use crate::platform::{self, Platform, PlatformKey};
use crate::runtime::Runtime;

pub use locator::{PlatformArtifact, locate, render_url};

/// Descriptor shipped with this build.
const BUILTIN_DESCRIPTOR: &str = include_str!("../../descriptor/toli.json");

/// A shell alias suggested in the caveats, e.g. `howto` for `toli --how`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub flag: String,
}

/// One row of the per-platform table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Published checksum, validated only when located.
    pub sha256: String,
    /// Overrides the release-level URL template for this platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Executable name inside the archive; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    /// Supports `{name}`, `{version}`, `{target}` and `{platform}`.
    pub url_template: String,
    #[serde(default)]
    pub aliases: Vec<Alias>,
    pub platforms: BTreeMap<PlatformKey, PlatformEntry>,
}

impl Release {
    /// The descriptor compiled into this binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DESCRIPTOR)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let release: Release = serde_json::from_str(json)
            .map_err(|e| InstallError::Descriptor(e.to_string()))?;
        release.validate()?;
        Ok(release)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading release descriptor from {:?}", path);
        let bytes = runtime
            .read(path)
            .map_err(|e| InstallError::Descriptor(format!("{}: {:#}", path.display(), e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| InstallError::Descriptor(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InstallError::Descriptor("name must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(InstallError::Descriptor("version must not be empty".into()));
        }
        let binary = self.binary_name();
        if binary.is_empty()
            || binary.contains('/')
            || binary.contains('\\')
            || binary == "."
            || binary == ".."
        {
            return Err(InstallError::Descriptor(format!(
                "binary name {:?} must be a plain file name",
                binary
            )));
        }
        if self.platforms.is_empty() {
            return Err(InstallError::Descriptor(
                "no platforms are published".into(),
            ));
        }
        Ok(())
    }

    pub fn binary_name(&self) -> &str {
        self.binary.as_deref().unwrap_or(&self.name)
    }

    pub fn supported_platforms(&self) -> impl Iterator<Item = PlatformKey> + '_ {
        self.platforms.keys().copied()
    }

    /// Resolve a host onto a key this release actually publishes.
    pub fn resolve_host(&self, host: &Platform) -> Result<PlatformKey> {
        let unsupported = || InstallError::UnsupportedPlatform {
            os: host.os.clone(),
            arch: host.arch.clone(),
            supported: platform::supported_list(self.supported_platforms()),
        };

        let key = platform::resolve(&host.os, &host.arch).map_err(|_| unsupported())?;
        if !self.platforms.contains_key(&key) {
            return Err(unsupported());
        }
        Ok(key)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InstallError, Result};

/// A supported OS/architecture combination.
///
/// Serialized as `<os>-<arch>`, e.g. `linux-x86_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlatformKey {
    #[serde(rename = "macos-x86_64")]
    MacosX86_64,
    #[serde(rename = "macos-aarch64")]
    MacosAarch64,
    #[serde(rename = "linux-x86_64")]
    LinuxX86_64,
    #[serde(rename = "linux-aarch64")]
    LinuxAarch64,
}

struct KeyInfo {
    key: PlatformKey,
    os: &'static str,
    arch: &'static str,
    name: &'static str,
    target: &'static str,
}

/// Adding a platform is a row here plus a variant above.
const KEYS: &[KeyInfo] = &[
    KeyInfo {
        key: PlatformKey::MacosX86_64,
        os: "macos",
        arch: "x86_64",
        name: "macos-x86_64",
        target: "x86_64-apple-darwin",
    },
    KeyInfo {
        key: PlatformKey::MacosAarch64,
        os: "macos",
        arch: "aarch64",
        name: "macos-aarch64",
        target: "aarch64-apple-darwin",
    },
    KeyInfo {
        key: PlatformKey::LinuxX86_64,
        os: "linux",
        arch: "x86_64",
        name: "linux-x86_64",
        target: "x86_64-unknown-linux-gnu",
    },
    KeyInfo {
        key: PlatformKey::LinuxAarch64,
        os: "linux",
        arch: "aarch64",
        name: "linux-aarch64",
        target: "aarch64-unknown-linux-gnu",
    },
];

impl PlatformKey {
    pub const ALL: [PlatformKey; 4] = [
        PlatformKey::MacosX86_64,
        PlatformKey::MacosAarch64,
        PlatformKey::LinuxX86_64,
        PlatformKey::LinuxAarch64,
    ];

    fn info(self) -> &'static KeyInfo {
        // KEYS rows are in variant order.
        &KEYS[self as usize]
    }

    /// Key string, e.g. `macos-x86_64`.
    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    /// Rust target triple used in archive names, e.g. `x86_64-apple-darwin`.
    pub fn target_triple(self) -> &'static str {
        self.info().target
    }

    pub fn os(self) -> &'static str {
        self.info().os
    }

    pub fn arch(self) -> &'static str {
        self.info().arch
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        KEYS.iter()
            .find(|info| info.name == lower || info.target == lower)
            .map(|info| info.key)
            .ok_or_else(|| InstallError::UnknownPlatformKey {
                key: lower.clone(),
                supported: supported_list(PlatformKey::ALL.iter().copied()),
            })
    }
}

fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "darwin" | "macos" | "osx" => "macos".to_string(),
        other => other.to_string(),
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "amd64" | "x86_64" | "x64" => "x86_64".to_string(),
        "arm64" | "aarch64" => "aarch64".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn supported_list(keys: impl Iterator<Item = PlatformKey>) -> String {
    keys.map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

/// Map a host OS/architecture pair onto a known platform key.
///
/// There is no fallback: an unknown pair is an `UnsupportedPlatform` error.
pub fn resolve(os: &str, arch: &str) -> Result<PlatformKey> {
    let norm_os = normalize_os(os);
    let norm_arch = normalize_arch(arch);

    KEYS.iter()
        .find(|info| info.os == norm_os && info.arch == norm_arch)
        .map(|info| info.key)
        .ok_or_else(|| InstallError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
            supported: supported_list(PlatformKey::ALL.iter().copied()),
        })
}

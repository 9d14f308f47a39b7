//! Platform detection and resolution
//!
//! This module detects the host OS and architecture and maps them onto the
//! finite set of platform keys a release publishes archives for.

mod detection;
mod key;

pub use detection::{DefaultPlatformDetector, Platform, PlatformDetector};
pub use key::{PlatformKey, resolve};
pub(crate) use key::supported_list;

#[cfg(test)]
pub use detection::MockPlatformDetector;

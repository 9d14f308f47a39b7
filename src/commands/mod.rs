use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    config::{DEFAULT_TIMEOUT_SECS, default_prefix},
    platform::{PlatformDetector, PlatformKey},
    release::Release,
    runtime::Runtime,
};

mod caveats;
mod install;
mod locate;
mod verify;

pub use caveats::caveats;
pub use install::install;
pub use locate::locate;
pub use verify::verify;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub prefix: Option<PathBuf>,
    pub descriptor: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            descriptor: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// The descriptor given on the command line, or the built-in one.
pub(crate) fn load_release<R: Runtime>(runtime: &R, options: &GlobalOptions) -> Result<Release> {
    let release = match &options.descriptor {
        Some(path) => Release::load(runtime, path)?,
        None => Release::builtin()?,
    };
    debug!("Using release {} {}", release.name, release.version);
    Ok(release)
}

pub(crate) fn resolve_prefix<R: Runtime>(runtime: &R, options: &GlobalOptions) -> Result<PathBuf> {
    match &options.prefix {
        Some(prefix) => Ok(prefix.clone()),
        None => default_prefix(runtime),
    }
}

/// An explicit `--platform`, or the host resolved against the release.
pub(crate) fn select_platform<P: PlatformDetector>(
    release: &Release,
    explicit: Option<PlatformKey>,
    detector: &P,
) -> Result<PlatformKey> {
    if let Some(key) = explicit {
        return Ok(key);
    }
    let host = detector.detect();
    debug!("Detected host platform {}", host);
    Ok(release.resolve_host(&host)?)
}

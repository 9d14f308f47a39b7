use anyhow::Result;

use crate::{
    platform::{DefaultPlatformDetector, PlatformKey},
    release::{self, PlatformArtifact},
    runtime::Runtime,
};

use super::{GlobalOptions, load_release, select_platform};

/// Print where the archive for this host (or `platform`) lives.
#[tracing::instrument(skip(runtime, options))]
pub fn locate<R: Runtime>(
    runtime: R,
    options: &GlobalOptions,
    version: Option<&str>,
    platform: Option<PlatformKey>,
) -> Result<()> {
    let release = load_release(&runtime, options)?;
    let version = version.unwrap_or(&release.version);
    let key = select_platform(&release, platform, &DefaultPlatformDetector)?;
    let artifact = release::locate(&release, key, version)?;
    print!("{}", format_artifact(&artifact));
    Ok(())
}

fn format_artifact(artifact: &PlatformArtifact) -> String {
    format!(
        "platform: {}\ntarget:   {}\nurl:      {}\nsha256:   {}\n",
        artifact.platform,
        artifact.platform.target_triple(),
        artifact.url,
        artifact.sha256
    )
}

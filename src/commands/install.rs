use anyhow::Result;
use log::warn;
use std::sync::Arc;

use crate::{
    archive::TarGzExtractor,
    config::InstallConfig,
    download::HttpDownloader,
    install::Installer,
    platform::{DefaultPlatformDetector, PlatformKey},
    release::locate,
    report,
    runtime::Runtime,
};

use super::{GlobalOptions, load_release, select_platform};

/// Resolve, locate and install, then print caveats and run the smoke test.
///
/// A failed smoke test is reported but does not fail the install.
#[tracing::instrument(skip(runtime, options))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    options: &GlobalOptions,
    version: Option<&str>,
    platform: Option<PlatformKey>,
) -> Result<()> {
    let release = load_release(&runtime, options)?;
    let config = InstallConfig::new(&runtime, options.prefix.clone(), options.timeout_secs)?;
    let version = version.unwrap_or(&release.version);

    let key = select_platform(&release, platform, &DefaultPlatformDetector)?;
    println!("   resolving {} {} for {}", release.name, version, key);
    let artifact = locate(&release, key, version)?;

    let runtime = Arc::new(runtime);
    let downloader = HttpDownloader::new(Arc::clone(&runtime), config.http_client.clone());
    let installer = Installer::new(Arc::clone(&runtime), downloader, TarGzExtractor);
    let layout = installer.install(&release, &artifact, &config.prefix).await?;

    println!(
        "   installed {} {} into {}",
        release.name,
        version,
        config.prefix.display()
    );
    println!();
    print!(
        "{}",
        report::caveats(&layout, release.binary_name(), &release.aliases)
    );

    if !report::verify(
        runtime.as_ref(),
        &config.prefix,
        release.binary_name(),
        version,
    ) {
        warn!(
            "{} was installed but `{} --version` did not report {}",
            release.name,
            layout.executable.display(),
            version
        );
    }
    Ok(())
}

//! Fetch, verify, extract and place one release artifact.
//!
//! Each step is a hard precondition for the next. Nothing is written under
//! the destination prefix until the archive has passed its checksum and
//! been unpacked into scratch space.

mod layout;
mod place;

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::archive::{ArchiveContents, ArchiveExtractor};
use crate::cleanup::{self, CleanupGuard, SharedCleanupContext};
use crate::digest::compute_sha256;
use crate::download::Downloader;
use crate::error::{IntegrityError, InstallError, Result};
use crate::release::{PlatformArtifact, Release};
use crate::runtime::Runtime;

pub use layout::{InstalledCompletion, InstalledLayout, Shell, executable_destination};
use place::{DATA_MODE, EXECUTABLE_MODE, place_file};

/// File name used for the download when the URL has none.
const FALLBACK_ARCHIVE_NAME: &str = "artifact.tar.gz";

pub struct Installer<R: Runtime, D: Downloader, E: ArchiveExtractor> {
    runtime: Arc<R>,
    downloader: D,
    extractor: E,
    cleanup_ctx: SharedCleanupContext,
}

impl<R: Runtime + 'static, D: Downloader, E: ArchiveExtractor> Installer<R, D, E> {
    pub fn new(runtime: Arc<R>, downloader: D, extractor: E) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            cleanup_ctx: cleanup::new_shared(),
        }
    }

    /// Install `artifact` of `release` under `prefix`.
    ///
    /// Returns the layout only when the executable (and every present
    /// completion script) is in place.
    #[tracing::instrument(skip(self, release, artifact))]
    pub async fn install(
        &self,
        release: &Release,
        artifact: &PlatformArtifact,
        prefix: &Path,
    ) -> Result<InstalledLayout> {
        let scratch = self.create_scratch(&artifact.url)?;
        let scratch_guard =
            CleanupGuard::new(Arc::clone(&self.cleanup_ctx), scratch.path().to_path_buf());

        let cleanup_ctx = Arc::clone(&self.cleanup_ctx);
        let ctrl_c_handler = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, cleaning up...");
                cleanup::lock(&cleanup_ctx).cleanup();
                std::process::exit(130);
            }
        });

        let result = self
            .install_in(scratch.path(), release, artifact, prefix)
            .await;

        ctrl_c_handler.abort();
        scratch_guard.finish();
        // `scratch` is removed when dropped here.
        result
    }

    fn create_scratch(&self, url: &str) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix("toli-installer-")
            .tempdir_in(self.runtime.temp_dir())
            .map_err(|e| InstallError::Download {
                url: url.to_string(),
                reason: format!("cannot create temporary directory: {}", e),
            })
    }

    async fn install_in(
        &self,
        scratch: &Path,
        release: &Release,
        artifact: &PlatformArtifact,
        prefix: &Path,
    ) -> Result<InstalledLayout> {
        let runtime = self.runtime.as_ref();
        let archive_path = scratch.join(archive_file_name(&artifact.url));

        println!(" downloading {}", artifact.url);
        let bytes = self
            .downloader
            .download(&artifact.url, &archive_path)
            .await
            .map_err(|e| InstallError::Download {
                url: artifact.url.clone(),
                reason: format!("{:#}", e),
            })?;
        debug!("Fetched {} bytes into {:?}", bytes, archive_path);

        println!("   verifying {}", artifact.sha256);
        verify_archive(runtime, &archive_path, artifact)?;

        println!("  extracting {}", release.name);
        let extract_dir = scratch.join("extracted");
        runtime
            .create_dir_all(&extract_dir)
            .and_then(|_| {
                self.extractor
                    .extract(runtime, &archive_path, &extract_dir)
            })
            .map_err(|e| InstallError::MalformedArchive(format!("{:#}", e)))?;
        let contents =
            ArchiveContents::scan(runtime, &extract_dir, &release.name, release.binary_name())?;

        println!("  installing {} into {}", release.name, prefix.display());
        let layout = place_contents(
            runtime,
            &contents,
            prefix,
            release.binary_name(),
            &self.cleanup_ctx,
        )?;

        info!(
            "Installed {} file(s) for {} {}",
            layout.files().len(),
            release.name,
            artifact.platform
        );
        Ok(layout)
    }
}

/// Hash the fetched archive and compare it with the published digest.
///
/// There is no way to skip this and no way to turn a failure into a warning.
#[tracing::instrument(skip(runtime, artifact))]
pub fn verify_archive<R: Runtime>(
    runtime: &R,
    archive_path: &Path,
    artifact: &PlatformArtifact,
) -> Result<()> {
    let actual = compute_sha256(runtime, archive_path).map_err(|e| IntegrityError::Unreadable {
        path: archive_path.to_path_buf(),
        reason: format!("{:#}", e),
    })?;

    if actual != artifact.sha256 {
        return Err(IntegrityError::Mismatch {
            url: artifact.url.clone(),
            expected: artifact.sha256.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }

    debug!("Checksum verified: {}", actual);
    Ok(())
}

/// Place the executable first, then every completion script the archive has.
fn place_contents<R: Runtime>(
    runtime: &R,
    contents: &ArchiveContents,
    prefix: &Path,
    binary: &str,
    cleanup_ctx: &SharedCleanupContext,
) -> Result<InstalledLayout> {
    let executable = executable_destination(prefix, binary);
    place_file(
        runtime,
        &contents.executable,
        &executable,
        EXECUTABLE_MODE,
        cleanup_ctx,
    )?;

    let mut completions = Vec::with_capacity(contents.completions.len());
    for (shell, script) in &contents.completions {
        let dest = shell.destination(prefix, binary);
        place_file(runtime, script, &dest, DATA_MODE, cleanup_ctx).inspect_err(|e| {
            warn!("Failed to install {} completions: {}", shell, e);
        })?;
        completions.push(InstalledCompletion {
            shell: *shell,
            path: dest,
        });
    }

    Ok(InstalledLayout {
        executable,
        completions,
    })
}

/// Last path segment of the URL, used to name the download.
fn archive_file_name(url: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query.rsplit('/').next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        PathBuf::from(FALLBACK_ARCHIVE_NAME)
    } else {
        PathBuf::from(name)
    }
}

use crate::digest::Sha256Digest;
use crate::error::{IntegrityError, InstallError, Result};
use crate::platform::PlatformKey;

use super::Release;

/// A downloadable archive plus the digest it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformArtifact {
    pub platform: PlatformKey,
    pub url: String,
    pub sha256: Sha256Digest,
}

/// Expand `{name}`, `{version}`, `{target}` and `{platform}` in a URL template.
pub fn render_url(template: &str, name: &str, version: &str, platform: PlatformKey) -> String {
    template
        .replace("{name}", name)
        .replace("{version}", version)
        .replace("{target}", platform.target_triple())
        .replace("{platform}", platform.as_str())
}

/// Look up the artifact for `platform` at `version`.
///
/// Pure table lookup. The checksum is taken verbatim from the release and
/// only validated for shape here; hashing happens after the fetch.
pub fn locate(release: &Release, platform: PlatformKey, version: &str) -> Result<PlatformArtifact> {
    let entry = release
        .platforms
        .get(&platform)
        .ok_or_else(|| InstallError::ArtifactNotFound {
            version: version.to_string(),
            platform: platform.to_string(),
        })?;

    let sha256 = Sha256Digest::try_from(entry.sha256.as_str()).map_err(|e| {
        IntegrityError::InvalidDigest {
            platform: platform.to_string(),
            reason: e.to_string(),
        }
    })?;

    let template = entry.url.as_deref().unwrap_or(&release.url_template);
    let url = render_url(template, &release.name, version, platform);

    Ok(PlatformArtifact {
        platform,
        url,
        sha256,
    })
}

use crate::runtime::{Runtime, is_path_under};
use anyhow::{Context, Result, anyhow, bail};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::path::{Component, Path};
use tar::{Archive, EntryType};

use super::ArchiveExtractor;

/// Extractor for .tar.gz archives
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    #[tracing::instrument(skip(self, runtime))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        let mut archive = Archive::new(GzDecoder::new(file));

        let mut extracted = 0usize;
        for entry in archive.entries().context("Failed to read tar.gz archive")? {
            let mut entry = entry.context("Failed to read archive entry")?;
            let entry_path = entry
                .path()
                .context("Archive entry has an invalid path")?
                .into_owned();

            if entry_path
                .components()
                .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
            {
                bail!("Archive entry {:?} has an absolute path", entry_path);
            }
            let full_path = extract_to.join(&entry_path);
            if !is_path_under(&full_path, extract_to) {
                bail!("Archive entry {:?} escapes the extraction directory", entry_path);
            }

            match entry.header().entry_type() {
                EntryType::Directory => {
                    runtime.create_dir_all(&full_path)?;
                }
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path)?;
                    std::io::copy(&mut entry, &mut dest_file)
                        .with_context(|| format!("Failed to extract file {:?}", full_path))?;
                    drop(dest_file);

                    #[cfg(unix)]
                    if let Ok(mode) = entry.header().mode()
                        && let Err(e) = runtime.set_permissions(&full_path, mode & 0o777)
                    {
                        debug!("Failed to set permissions on {:?}: {}", full_path, e);
                    }
                    extracted += 1;
                }
                other => {
                    debug!("Skipping {:?} entry {:?}", other, entry_path);
                }
            }
        }

        if extracted == 0 {
            return Err(anyhow!("Archive contains no files."));
        }

        info!("Extracted {} file(s).", extracted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs::{self, File};
    use tar::Builder;
    use tempfile::tempdir;

    fn create_test_archive(path: &Path, files: &[(&str, &str, u32)]) -> Result<()> {
        let file = File::create(path)?;
        let enc = GzEncoder::new(file, Compression::default());
        let mut tar = Builder::new(enc);

        for (name, content, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(name)?;
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            tar.append(&header, content.as_bytes())?;
        }

        tar.into_inner()?.finish()?;
        Ok(())
    }

    #[test]
    fn test_extract_binary_and_completions() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("toli.tar.gz");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        create_test_archive(
            &archive_path,
            &[
                ("toli", "#!/bin/sh\necho toli 0.1.0\n", 0o755),
                ("completions/toli.bash", "complete -F _toli toli", 0o644),
            ],
        )?;

        TarGzExtractor.extract(&RealRuntime, &archive_path, &extract_path)?;

        assert!(extract_path.join("toli").is_file());
        assert_eq!(
            fs::read_to_string(extract_path.join("completions/toli.bash"))?,
            "complete -F _toli toli"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(extract_path.join("toli"))?.permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
        Ok(())
    }

    #[test]
    fn test_extract_rejects_parent_traversal() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("evil.tar.gz");
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        // Header::set_path refuses "..", so write the name bytes directly.
        let file = File::create(&archive_path)?;
        let mut tar = Builder::new(GzEncoder::new(file, Compression::default()));
        let content = b"owned";
        let mut header = tar::Header::new_old();
        let name = b"../escape";
        header.as_old_mut().name[..name.len()].copy_from_slice(name);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append(&header, &content[..])?;
        tar.into_inner()?.finish()?;

        let result = TarGzExtractor.extract(&RealRuntime, &archive_path, &extract_path);
        assert!(result.is_err());
        assert!(!dir.path().join("escape").exists());
        Ok(())
    }

    #[test]
    fn test_extract_not_gzip() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("plain.tar.gz");
        fs::write(&archive_path, "this is not gzip")?;
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        let result = TarGzExtractor.extract(&RealRuntime, &archive_path, &extract_path);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_extract_empty_archive() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("empty.tar.gz");
        create_test_archive(&archive_path, &[])?;
        let extract_path = dir.path().join("extracted");
        fs::create_dir(&extract_path)?;

        let err = TarGzExtractor
            .extract(&RealRuntime, &archive_path, &extract_path)
            .unwrap_err();
        assert!(err.to_string().contains("no files"));
        Ok(())
    }
}

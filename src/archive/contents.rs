use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::install::Shell;
use crate::runtime::Runtime;

/// Directory inside the archive holding completion scripts.
const COMPLETIONS_DIR: &str = "completions";

/// What an extracted archive provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveContents {
    pub executable: PathBuf,
    /// Present completion scripts; absent shells are simply missing.
    pub completions: Vec<(Shell, PathBuf)>,
}

impl ArchiveContents {
    /// Locate `<binary>` and `completions/<name>.<shell>` under `extract_dir`.
    ///
    /// A single wrapping top-level directory is looked through. A missing
    /// executable is fatal; missing completion scripts are not.
    #[tracing::instrument(skip(runtime))]
    pub fn scan<R: Runtime>(
        runtime: &R,
        extract_dir: &Path,
        name: &str,
        binary: &str,
    ) -> Result<Self> {
        let root = find_root(runtime, extract_dir, binary)?;
        let executable = root.join(binary);
        debug!("Found executable at {:?}", executable);

        let completions_dir = root.join(COMPLETIONS_DIR);
        let mut completions = Vec::new();
        if runtime.is_dir(&completions_dir) {
            for shell in Shell::ALL {
                let script = completions_dir.join(shell.source_file_name(name));
                if is_file(runtime, &script) {
                    completions.push((shell, script));
                } else {
                    warn!(
                        "No {} completion script in archive; skipping {} completions.",
                        shell.source_file_name(name),
                        shell
                    );
                }
            }
        } else {
            warn!("Archive has no {}/ directory; installing the executable only.", COMPLETIONS_DIR);
        }

        Ok(Self {
            executable,
            completions,
        })
    }
}

fn is_file<R: Runtime>(runtime: &R, path: &Path) -> bool {
    runtime.exists(path) && !runtime.is_dir(path)
}

fn find_root<R: Runtime>(runtime: &R, extract_dir: &Path, binary: &str) -> Result<PathBuf> {
    if is_file(runtime, &extract_dir.join(binary)) {
        return Ok(extract_dir.to_path_buf());
    }

    let entries = runtime.read_dir(extract_dir).map_err(|e| {
        InstallError::MalformedArchive(format!("cannot read extracted files: {:#}", e))
    })?;
    if let [only] = entries.as_slice()
        && runtime.is_dir(only)
        && is_file(runtime, &only.join(binary))
    {
        debug!("Using wrapping directory {:?} as archive root", only);
        return Ok(only.clone());
    }

    Err(InstallError::MalformedArchive(format!(
        "executable `{}` not found at the archive root",
        binary
    )))
}

//! Release archive extraction and inspection.

mod contents;
mod tar_gz;

use crate::runtime::Runtime;
use anyhow::Result;
use std::path::Path;

pub use contents::ArchiveContents;
pub use tar_gz::TarGzExtractor;

/// Unpacks a verified archive into a scratch directory.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive_path` into the existing directory `extract_to`.
    ///
    /// Entries that would land outside `extract_to` are an error.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<()>;
}

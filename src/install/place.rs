use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleanup::{CleanupGuard, SharedCleanupContext};
use crate::error::{InstallError, Result};
use crate::runtime::Runtime;

pub(crate) const EXECUTABLE_MODE: u32 = 0o755;
pub(crate) const DATA_MODE: u32 = 0o644;

/// Sibling path a file is staged at before being renamed over `dest`.
pub(crate) fn staging_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()))
}

/// Copy `src` to `dest` so that `dest` is never observed half-written.
///
/// The content is staged next to `dest` (same filesystem) and renamed over
/// it, replacing any previous install. The staged file is removed on error.
#[tracing::instrument(skip(runtime, cleanup_ctx))]
pub(crate) fn place_file<R: Runtime>(
    runtime: &R,
    src: &Path,
    dest: &Path,
    mode: u32,
    cleanup_ctx: &SharedCleanupContext,
) -> Result<()> {
    let placement_error = |e: anyhow::Error| InstallError::Placement {
        path: dest.to_path_buf(),
        reason: format!("{:#}", e),
    };

    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent).map_err(placement_error)?;
    }

    let guard = CleanupGuard::new(Arc::clone(cleanup_ctx), staging_path(dest));
    let staged = guard.path().to_path_buf();
    debug!("Staging {:?} at {:?}", src, staged);

    let result = runtime
        .copy(src, &staged)
        .and_then(|_| runtime.set_permissions(&staged, mode))
        .and_then(|_| runtime.rename(&staged, dest));

    if let Err(e) = result {
        if runtime.exists(&staged) {
            let _ = runtime.remove_file(&staged);
        }
        guard.finish();
        return Err(placement_error(e));
    }

    guard.finish();
    debug!("Placed {:?}", dest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::{lock, new_shared};
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let staged = staging_path(Path::new("/p/bin/toli"));
        assert_eq!(staged.parent(), Some(Path::new("/p/bin")));
        let name = staged.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".toli.tmp-"));
    }

    #[test]
    fn test_place_file_creates_dirs_and_replaces() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("toli");
        fs::write(&src, "new").unwrap();
        let dest = dir.path().join("prefix/bin/toli");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "old").unwrap();

        let ctx = new_shared();
        place_file(&RealRuntime, &src, &dest, EXECUTABLE_MODE, &ctx).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
        assert!(!staging_path(&dest).exists());
        assert!(lock(&ctx).paths.is_empty());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, EXECUTABLE_MODE);
        }
    }

    #[test]
    fn test_place_file_rename_failure_removes_staged_file() {
        let dest = PathBuf::from("/p/bin/toli");
        let staged = staging_path(&dest);

        let mut runtime = MockRuntime::new();
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/p/bin")))
            .returning(|_| Ok(()));
        runtime
            .expect_copy()
            .with(eq(PathBuf::from("/scratch/toli")), eq(staged.clone()))
            .returning(|_, _| Ok(4));
        runtime.expect_set_permissions().returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .returning(|_, _| Err(anyhow::anyhow!("Permission denied")));
        runtime
            .expect_exists()
            .with(eq(staged.clone()))
            .returning(|_| true);
        runtime
            .expect_remove_file()
            .with(eq(staged.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let ctx = new_shared();
        let err = place_file(
            &runtime,
            Path::new("/scratch/toli"),
            &dest,
            EXECUTABLE_MODE,
            &ctx,
        )
        .unwrap_err();

        match err {
            InstallError::Placement { path, reason } => {
                assert_eq!(path, dest);
                assert!(reason.contains("Permission denied"));
            }
            other => panic!("Expected Placement, got {other:?}"),
        }
        assert!(lock(&ctx).paths.is_empty());
    }

    #[test]
    fn test_place_file_unwritable_directory() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_create_dir_all()
            .returning(|_| Err(anyhow::anyhow!("Read-only file system")));

        let ctx = new_shared();
        let err = place_file(
            &runtime,
            Path::new("/scratch/toli"),
            Path::new("/p/bin/toli"),
            EXECUTABLE_MODE,
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, InstallError::Placement { .. }));
    }
}

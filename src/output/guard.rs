//! Output directory lifecycle: safety check, wipe, recreate.
//!
//! Runs once before any file is written. Either the output directory ends up
//! existing and empty, or an error is returned and nothing is processed.

use std::fs::{self, DirBuilder};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::utils::path::normalize_path_in;

use super::RetryPolicy;

/// Clear and recreate the output directory, resolving relative paths against `cwd`.
///
/// Returns the resolved output path.
pub fn prepare_output_dir(
    output: &Path,
    source: &Path,
    cwd: &Path,
    retry: RetryPolicy,
) -> Result<PathBuf, PipelineError> {
    prepare_output_dir_with(output, source, cwd, retry, remove_path)
}

fn prepare_output_dir_with(
    output: &Path,
    source: &Path,
    cwd: &Path,
    retry: RetryPolicy,
    remove: impl FnMut(&Path) -> io::Result<()>,
) -> Result<PathBuf, PipelineError> {
    let target = normalize_path_in(output, cwd);

    // Safety gate: must run before anything is deleted
    check_not_protected(&target, source, cwd)?;

    remove_existing(&target, retry, remove)?;
    create_output(&target)?;

    crate::debug!("clean"; "output ready at {}", target.display());
    Ok(target)
}

/// Locations that must never be wiped: the working directory, its filesystem
/// root and `<cwd>/src`.
pub fn protected_paths(cwd: &Path) -> Vec<PathBuf> {
    let cwd = normalize_path_in(cwd, cwd);
    let root = cwd.ancestors().last().map(Path::to_path_buf);

    let mut paths = vec![normalize_path_in(Path::new("src"), &cwd)];
    paths.extend(root);
    paths.push(cwd);
    paths
}

fn check_not_protected(target: &Path, source: &Path, cwd: &Path) -> Result<(), PipelineError> {
    let source = normalize_path_in(source, cwd);

    // Wiping the source root or any of its ancestors would destroy the inputs
    let is_protected = protected_paths(cwd).iter().any(|p| p == target) || source.starts_with(target);

    if is_protected {
        return Err(PipelineError::ProtectedPath {
            path: target.to_path_buf(),
        });
    }
    Ok(())
}

fn remove_existing(
    target: &Path,
    retry: RetryPolicy,
    mut remove: impl FnMut(&Path) -> io::Result<()>,
) -> Result<(), PipelineError> {
    retry
        .run(|| remove(target))
        .map_err(|(attempts, source)| PipelineError::Deletion {
            path: target.to_path_buf(),
            attempts,
            source,
        })
}

/// Remove a directory tree, file or symlink. A missing path is not an error.
fn remove_path(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn create_output(target: &Path) -> Result<(), PipelineError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    builder
        .create(target)
        .map_err(|source| PipelineError::CreateOutput {
            path: target.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const FAST: RetryPolicy = RetryPolicy {
        max_retries: 3,
        delay: Duration::from_millis(1),
    };

    /// Temp project with `cwd/`, `cwd/src/` and a marker file in each.
    fn project() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let cwd = dir.path().canonicalize().unwrap().join("project");
        fs::create_dir_all(cwd.join("src")).unwrap();
        fs::write(cwd.join("marker"), "keep").unwrap();
        fs::write(cwd.join("src/marker"), "keep").unwrap();
        (dir, cwd)
    }

    fn assert_untouched(cwd: &Path) {
        assert!(cwd.join("marker").exists());
        assert!(cwd.join("src/marker").exists());
    }

    #[test]
    fn test_rejects_cwd() {
        let (_dir, cwd) = project();
        let absolute = cwd.display().to_string();
        for spelling in [".", "./", "", "src/..", absolute.as_str()] {
            let err = prepare_output_dir(Path::new(spelling), &cwd, &cwd, FAST).unwrap_err();
            assert!(
                matches!(err, PipelineError::ProtectedPath { .. }),
                "{spelling:?} should be protected"
            );
        }
        assert_untouched(&cwd);
    }

    #[test]
    fn test_rejects_src() {
        let (_dir, cwd) = project();
        let source = cwd.join("public");
        fs::create_dir_all(&source).unwrap();

        for spelling in ["src", "./src/", "dist/../src"] {
            let err = prepare_output_dir(Path::new(spelling), &source, &cwd, FAST).unwrap_err();
            assert!(matches!(err, PipelineError::ProtectedPath { .. }));
        }
        assert_untouched(&cwd);
    }

    #[test]
    fn test_rejects_source_and_ancestors() {
        let (_dir, cwd) = project();
        let source = cwd.join("site/static");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.css"), "a {}").unwrap();

        for spelling in ["site", "site/static"] {
            let err = prepare_output_dir(Path::new(spelling), &source, &cwd, FAST).unwrap_err();
            assert!(matches!(err, PipelineError::ProtectedPath { .. }));
        }
        assert!(source.join("a.css").exists());
    }

    #[test]
    fn test_clean_slate() {
        let (_dir, cwd) = project();
        let dist = cwd.join("dist");
        fs::create_dir_all(dist.join("old/nested")).unwrap();
        fs::write(dist.join("old/nested/stale.css.gz"), "stale").unwrap();
        fs::write(dist.join("stale.txt"), "stale").unwrap();

        let resolved = prepare_output_dir(Path::new("dist"), &cwd, &cwd, FAST).unwrap();
        assert_eq!(resolved, dist);
        assert!(dist.is_dir());
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);

        // writable
        fs::write(dist.join("touch.txt"), "ok").unwrap();
        assert_untouched(&cwd);
    }

    #[test]
    fn test_deletion_retries_then_fails() {
        let (_dir, cwd) = project();
        let calls = std::cell::Cell::new(0);

        let err = prepare_output_dir_with(Path::new("dist"), &cwd, &cwd, FAST, |_| {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        })
        .unwrap_err();

        match err {
            PipelineError::Deletion { path, attempts, source } => {
                assert_eq!(path, cwd.join("dist"));
                assert_eq!(attempts, 4);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected a deletion error, got {other:?}"),
        }
        assert_eq!(calls.get(), 4);
        // never reached the create step
        assert!(!cwd.join("dist").exists());
    }

    #[test]
    fn test_deletion_recovers_on_retry() {
        let (_dir, cwd) = project();
        let calls = std::cell::Cell::new(0);

        let dist = prepare_output_dir_with(Path::new("dist"), &cwd, &cwd, FAST, |path| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(io::Error::new(io::ErrorKind::Other, "busy"))
            } else {
                remove_path(path)
            }
        })
        .unwrap();

        assert_eq!(calls.get(), 3);
        assert!(dist.is_dir());
    }

    #[test]
    fn test_creates_missing_parents() {
        let (_dir, cwd) = project();
        let resolved =
            prepare_output_dir(Path::new("build/out/dist"), &cwd, &cwd, FAST).unwrap();
        assert!(resolved.is_dir());
        assert_eq!(resolved, cwd.join("build/out/dist"));
    }

    #[test]
    fn test_replaces_file_at_output_path() {
        let (_dir, cwd) = project();
        fs::write(cwd.join("dist"), "not a dir").unwrap();

        prepare_output_dir(Path::new("dist"), &cwd, &cwd, FAST).unwrap();
        assert!(cwd.join("dist").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_output_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, cwd) = project();
        let dist = prepare_output_dir(Path::new("dist"), &cwd, &cwd, FAST).unwrap();
        let mode = fs::metadata(&dist).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !0o755, 0);
        assert_ne!(mode & 0o700, 0);
    }

    #[test]
    fn test_protected_paths_set() {
        let (_dir, cwd) = project();
        let paths = protected_paths(&cwd);
        assert!(paths.contains(&cwd));
        assert!(paths.contains(&cwd.join("src")));
        assert!(paths.iter().any(|p| p.parent().is_none()));
    }

    #[test]
    fn test_root_is_protected() {
        let (_dir, cwd) = project();
        let root = cwd.ancestors().last().unwrap().to_path_buf();
        // checked without the delete step
        let err = check_not_protected(&root, &cwd.join("public"), &cwd).unwrap_err();
        assert!(matches!(err, PipelineError::ProtectedPath { .. }));
    }
}

//! Source tree scanning (pure, no side effects).

use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::error::PipelineError;

/// Collect every file under `root`, flattened into one list.
///
/// Directories are descended into but never returned. Nothing is filtered:
/// hidden files are included and classification is left to the transformer.
/// Symlinks are not followed; a symlink is returned only if it resolves to a file.
///
/// Order follows the filesystem and is not sorted. An unreadable directory
/// anywhere in the tree aborts the scan.
pub fn scan_source_files(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).skip_hidden(false).follow_links(false);
    for entry in walker {
        let mut entry = entry.map_err(|err| traversal_error(err, root))?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            // jwalk reports a failed `read_dir` on the entry, not as an `Err` item
            if let Some(err) = entry.read_children_error.take() {
                return Err(traversal_error(err, &entry.path()));
            }
            continue;
        }

        let path = entry.path();
        if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            files.push(path);
        }
    }

    Ok(files)
}

fn traversal_error(err: jwalk::Error, fallback: &Path) -> PipelineError {
    let path = err.path().map_or_else(|| fallback.to_path_buf(), Path::to_path_buf);
    PipelineError::Traversal {
        path,
        source: io::Error::from(err),
    }
}

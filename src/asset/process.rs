//! Per-file transformation with side effects (copy, gzip).

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use flate2::{Compression, GzBuilder};

use crate::config::PrezipConfig;
use crate::error::{Stage, TransformError};

use super::{Disposition, FileRecord, fingerprint};

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub disposition: Disposition,
    /// A gzip artifact was written.
    pub compressed: bool,
    /// A verbatim copy was written.
    pub copied: bool,
}

/// Transform one source file into the output tree.
///
/// The mirrored target directory is created first, for every file. Then:
/// 1. excluded extensions are copied verbatim and nothing else happens;
/// 2. compressible extensions get `{stem}-{fingerprint}{ext}.gz`, refusing
///    to overwrite an existing artifact;
/// 3. with `keep_original`, the file is copied verbatim (after step 2, or on
///    its own for unmatched extensions).
pub fn process_file(path: &Path, config: &PrezipConfig) -> Result<ProcessOutcome, TransformError> {
    let record = FileRecord::new(path, config);
    let disposition = Disposition::classify(&record.extension_lower(), config);
    crate::debug!("file"; "{} -> {}", record.source.display(), disposition.name());

    fs::create_dir_all(&record.target_dir)
        .map_err(|e| TransformError::io(Stage::CreateDir, &record.target_dir, e))?;

    let mut outcome = ProcessOutcome {
        disposition,
        compressed: false,
        copied: false,
    };

    if disposition == Disposition::Exclude {
        copy_original(&record)?;
        outcome.copied = true;
        return Ok(outcome);
    }

    if disposition == Disposition::Compress {
        write_artifact(&record)?;
        outcome.compressed = true;
    }

    if config.keep_original {
        copy_original(&record)?;
        outcome.copied = true;
    }

    Ok(outcome)
}

fn copy_original(record: &FileRecord) -> Result<(), TransformError> {
    fs::copy(&record.source, record.copy_target())
        .map(|_| ())
        .map_err(|e| TransformError::io(Stage::Copy, &record.source, e))
}

fn write_artifact(record: &FileRecord) -> Result<(), TransformError> {
    let content =
        fs::read(&record.source).map_err(|e| TransformError::io(Stage::Read, &record.source, e))?;
    let hash = fingerprint(&content);
    let compressed =
        gzip(&content).map_err(|e| TransformError::io(Stage::Compress, &record.source, e))?;

    let target = record.artifact_target(&hash);
    write_new(&target, &compressed)
}

/// Gzip at maximum compression with a zeroed mtime, so output depends only on content.
fn gzip(content: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len() / 2 + 64);
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(&mut out, Compression::best());
    encoder.write_all(content)?;
    encoder.finish()?;
    Ok(out)
}

/// Write `bytes` to a file that must not exist yet.
fn write_new(target: &Path, bytes: &[u8]) -> Result<(), TransformError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => TransformError::Collision {
                path: target.to_path_buf(),
            },
            _ => TransformError::io(Stage::WriteArtifact, target, e),
        })?;

    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| TransformError::io(Stage::WriteArtifact, target, e))
}

//! Source → output path mapping for a single file.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::config::PrezipConfig;

/// Paths derived from one discovered input file.
///
/// ```text
/// source:     /site/css/app.css
/// source dir: /site
/// output dir: /site/dist
/// ─────────────────────────────────
/// target_dir: /site/dist/css
/// file_name:  app.css
/// stem:       app
/// extension:  .css (classification), .css (artifact name)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute input path.
    pub source: PathBuf,
    /// Mirrored output directory for this file.
    pub target_dir: PathBuf,
    /// Full file name (`app.css`), byte for byte.
    pub file_name: OsString,
    /// File name without its final extension (`app`).
    pub stem: OsString,
    /// Final extension as written, dot-prefixed (`.CSS`), or empty.
    pub extension: OsString,
}

impl FileRecord {
    /// Derive the record for `source` under the configured source/output roots.
    ///
    /// Files outside the source root are mirrored into the output root itself.
    pub fn new(source: &Path, config: &PrezipConfig) -> Self {
        let parent = source.parent().unwrap_or(Path::new(""));
        let rel_dir = parent.strip_prefix(&config.source).unwrap_or(Path::new(""));

        let file_name = source.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let stem = source.file_stem().map(OsStr::to_os_string).unwrap_or_default();
        let extension = source
            .extension()
            .map(|ext| {
                let mut dotted = OsString::from(".");
                dotted.push(ext);
                dotted
            })
            .unwrap_or_default();

        Self {
            source: source.to_path_buf(),
            target_dir: config.output.join(rel_dir),
            file_name,
            stem,
            extension,
        }
    }

    /// Lower-cased extension used for classification only.
    pub fn extension_lower(&self) -> String {
        self.extension.to_string_lossy().to_lowercase()
    }

    /// Destination of a verbatim copy.
    pub fn copy_target(&self) -> PathBuf {
        self.target_dir.join(&self.file_name)
    }

    /// Destination of the gzip artifact: `{stem}-{fingerprint}{ext}.gz`.
    pub fn artifact_target(&self, fingerprint: &str) -> PathBuf {
        let mut name = self.stem.clone();
        name.push("-");
        name.push(fingerprint);
        name.push(&self.extension);
        name.push(".gz");
        self.target_dir.join(name)
    }
}

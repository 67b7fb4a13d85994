//! File disposition classification.

use crate::config::PrezipConfig;

/// What the transformer does with a file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Copied verbatim; nothing else happens to it.
    Exclude,
    /// Gzipped under a fingerprinted name (plus a copy if `keep_original`).
    Compress,
    /// Matches neither list; copied only if `keep_original`.
    Passthrough,
}

impl Disposition {
    /// Classify a lower-cased, dot-prefixed extension (`""` for none).
    ///
    /// Exclusion is checked first, so an extension listed in both sets is excluded.
    pub fn classify(extension: &str, config: &PrezipConfig) -> Self {
        if config.is_excluded(extension) {
            Self::Exclude
        } else if config.is_compressible(extension) {
            Self::Compress
        } else {
            Self::Passthrough
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Exclude => "exclude",
            Self::Compress => "compress",
            Self::Passthrough => "passthrough",
        }
    }
}

//! Pipeline error types.
//!
//! Every variant is fatal for the run. The split mirrors the phases:
//!
//! | Variant         | Phase      | Retried |
//! |-----------------|------------|---------|
//! | `WorkingDir`    | guard      | no      |
//! | `ProtectedPath` | guard      | no      |
//! | `Deletion`      | guard      | yes     |
//! | `CreateOutput`  | guard      | no      |
//! | `Traversal`     | walk       | no      |
//! | `Scheduler`     | processing | no      |
//! | `Transform`     | processing | no      |
//! | `Aborted`       | processing | no      |

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// PipelineError
// ============================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot resolve the current working directory")]
    WorkingDir(#[source] io::Error),

    #[error("refusing to delete protected directory `{}`", .path.display())]
    ProtectedPath { path: PathBuf },

    #[error("failed to delete `{}` after {attempts} attempts", .path.display())]
    Deletion {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory `{}`", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list source tree at `{}`", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start worker pool")]
    Scheduler(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to process `{}`", .file.display())]
    Transform {
        file: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error("interrupted after {completed} of {total} files")]
    Aborted { completed: usize, total: usize },
}

impl PipelineError {
    pub fn transform(file: impl Into<PathBuf>, source: TransformError) -> Self {
        Self::Transform {
            file: file.into(),
            source,
        }
    }
}

// ============================================================================
// TransformError
// ============================================================================

/// Step of the per-file transformation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateDir,
    Read,
    Compress,
    WriteArtifact,
    Copy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateDir => "create directory",
            Self::Read => "read",
            Self::Compress => "compress",
            Self::WriteArtifact => "write artifact",
            Self::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Failure while transforming a single file.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{stage} failed for `{}`", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `create_new` refused to overwrite an existing artifact.
    #[error("artifact `{}` already exists", .path.display())]
    Collision { path: PathBuf },
}

impl TransformError {
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    pub const fn stage(&self) -> Stage {
        match self {
            Self::Io { stage, .. } => *stage,
            Self::Collision { .. } => Stage::WriteArtifact,
        }
    }
}

//! Build pipeline: clean the output, list the source tree, transform in batches.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//! │ Output Guard │ -> │ Tree Walker  │ -> │ Batch Scheduler          │
//! │ wipe + mkdir │    │ flat listing │    │ process_file × window    │
//! └──────────────┘    └──────────────┘    └──────────────────────────┘
//! ```
//!
//! The phases are strictly sequential. Nothing is read from the source tree
//! until the output directory exists and is empty.

mod batch;

pub use batch::{BatchFailure, BatchScheduler, DEFAULT_WINDOW};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::asset::{Disposition, ProcessOutcome, process_file, scan_source_files};
use crate::config::PrezipConfig;
use crate::error::PipelineError;
use crate::logger::{ProgressLine, format_elapsed};
use crate::output::{RetryPolicy, prepare_output_dir};
use crate::utils::plural::plural_count;
use crate::log;

// =============================================================================
// Types
// =============================================================================

/// Tally of one successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Resolved output directory.
    pub output: PathBuf,
    /// Files listed by the walker.
    pub files: usize,
    /// Gzip artifacts written.
    pub compressed: usize,
    /// Verbatim copies written (any disposition).
    pub copied: usize,
    /// Files matched by the exclude list.
    pub excluded: usize,
    /// Files that produced no output at all.
    pub skipped: usize,
    pub clean_elapsed: Duration,
    pub process_elapsed: Duration,
}

impl BuildReport {
    fn record(&mut self, outcome: &ProcessOutcome) {
        self.compressed += usize::from(outcome.compressed);
        self.copied += usize::from(outcome.copied);
        if outcome.disposition == Disposition::Exclude {
            self.excluded += 1;
        }
        if !outcome.compressed && !outcome.copied {
            self.skipped += 1;
        }
    }

    /// `3 compressed, 5 copied, 2 excluded, 1 skipped`
    pub fn summary(&self) -> String {
        format!(
            "{} compressed, {} copied, {} excluded, {} skipped",
            self.compressed, self.copied, self.excluded, self.skipped
        )
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Run the whole pipeline against the process working directory.
///
/// Stops before the next batch once Ctrl+C has been received.
pub fn run(config: &PrezipConfig, quiet: bool) -> Result<BuildReport, PipelineError> {
    let cwd = std::env::current_dir().map_err(PipelineError::WorkingDir)?;
    run_in(config, &cwd, quiet, crate::core::is_shutdown)
}

/// Same as [`run`] with an explicit working directory and stop condition.
pub fn run_in<S>(
    config: &PrezipConfig,
    cwd: &Path,
    quiet: bool,
    should_stop: S,
) -> Result<BuildReport, PipelineError>
where
    S: Fn() -> bool,
{
    // Phase 1: output guard
    let started = Instant::now();
    let output = prepare_output_dir(&config.output, &config.source, cwd, RetryPolicy::DELETE)?;
    let clean_elapsed = started.elapsed();
    if !quiet {
        log!("clean"; "done in {}", format_elapsed(clean_elapsed));
    }

    let config = PrezipConfig {
        output,
        ..config.clone()
    };

    // Phase 2: walk + transform
    let started = Instant::now();
    let files = scan_source_files(&config.source)?;
    crate::debug!("build"; "found {} under {}", plural_count(files.len(), "file"), config.source.display());

    let outcomes = process_all(&files, &config, quiet, should_stop)?;

    let mut report = BuildReport {
        output: config.output.clone(),
        files: files.len(),
        clean_elapsed,
        process_elapsed: started.elapsed(),
        ..BuildReport::default()
    };
    for outcome in &outcomes {
        report.record(outcome);
    }

    if !quiet {
        log!(
            "build";
            "{} processed in {} ({})",
            plural_count(report.files, "file"),
            format_elapsed(report.process_elapsed),
            report.summary()
        );
    }

    Ok(report)
}

fn process_all<S>(
    files: &[PathBuf],
    config: &PrezipConfig,
    quiet: bool,
    should_stop: S,
) -> Result<Vec<ProcessOutcome>, PipelineError>
where
    S: Fn() -> bool,
{
    let scheduler = BatchScheduler::new(config.concurrency)?;
    crate::debug!("build"; "processing in windows of {}", scheduler.window());
    let progress = (!quiet).then(|| ProgressLine::new(&[("files", files.len())]));

    let result = scheduler.run(
        files,
        |path| {
            let outcome = process_file(path, config).map_err(|err| PipelineError::transform(path, err));
            if let Some(progress) = &progress {
                progress.inc("files");
            }
            outcome
        },
        should_stop,
    );

    match result {
        Ok(outcomes) => {
            if let Some(progress) = progress {
                progress.finish();
            }
            Ok(outcomes)
        }
        // Dropping the progress line clears it before the error is reported
        Err(BatchFailure::Failed { batch, error }) => {
            if let PipelineError::Transform { source, .. } = &error {
                crate::debug!("build"; "window {} failed during {}", batch + 1, source.stage());
            }
            Err(error)
        }
        Err(BatchFailure::Interrupted { completed }) => Err(PipelineError::Aborted {
            completed,
            total: files.len(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::fingerprint;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Project {
        _dir: TempDir,
        cwd: PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let cwd = dir.path().canonicalize().unwrap();
            Self { _dir: dir, cwd }
        }

        fn write(&self, rel: &str, content: &[u8]) {
            let path = self.cwd.join("site").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn config(&self, keep_original: bool) -> PrezipConfig {
            let mut config = PrezipConfig {
                source: PathBuf::from("site"),
                output: PathBuf::from("dist"),
                keep_original,
                ..PrezipConfig::default()
            };
            config.normalize(&self.cwd);
            config
        }

        fn run(&self, config: &PrezipConfig) -> Result<BuildReport, PipelineError> {
            run_in(config, &self.cwd, true, || false)
        }

        fn dist(&self) -> PathBuf {
            self.cwd.join("dist")
        }

        fn listing(&self) -> Vec<String> {
            let dist = self.dist();
            let mut names: Vec<String> = jwalk::WalkDir::new(&dist)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| {
                    e.path()
                        .strip_prefix(&dist)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/")
                })
                .collect();
            names.sort();
            names
        }
    }

    fn gunzip(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(fs::File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_mixed_tree_keep_original() {
        let project = Project::new();
        project.write("a.css", b"body{}");
        project.write("b.png", b"\x89PNG");
        project.write("c.txt", b"hello");

        let report = project.run(&project.config(true)).unwrap();

        let fp = fingerprint(b"body{}");
        assert_eq!(
            project.listing(),
            vec![
                format!("a-{fp}.css.gz"),
                "a.css".to_string(),
                "b.png".to_string(),
                "c.txt".to_string(),
            ]
        );
        assert_eq!(gunzip(&project.dist().join(format!("a-{fp}.css.gz"))), b"body{}");
        assert_eq!(fs::read(project.dist().join("b.png")).unwrap(), b"\x89PNG");

        assert_eq!(report.files, 3);
        assert_eq!(report.compressed, 1);
        assert_eq!(report.copied, 3);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.output, project.dist());
    }

    #[test]
    fn test_mixed_tree_without_originals() {
        let project = Project::new();
        project.write("a.css", b"body{}");
        project.write("b.png", b"\x89PNG");
        project.write("c.txt", b"hello");

        let report = project.run(&project.config(false)).unwrap();

        let fp = fingerprint(b"body{}");
        assert_eq!(
            project.listing(),
            vec![format!("a-{fp}.css.gz"), "b.png".to_string()]
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(report.copied, 1);
        assert_eq!(report.summary(), "1 compressed, 1 copied, 1 excluded, 1 skipped");
    }

    #[test]
    fn test_nested_tree_is_mirrored() {
        let project = Project::new();
        project.write("js/app.js", b"let a = 1;");
        project.write("js/vendor/lib.js", b"let b = 2;");
        project.write("index.html", b"<p>hi</p>");

        project.run(&project.config(false)).unwrap();

        let app = format!("js/app-{}.js.gz", fingerprint(b"let a = 1;"));
        let lib = format!("js/vendor/lib-{}.js.gz", fingerprint(b"let b = 2;"));
        let index = format!("index-{}.html.gz", fingerprint(b"<p>hi</p>"));
        assert_eq!(project.listing(), {
            let mut expected = vec![index, app, lib];
            expected.sort();
            expected
        });
    }

    #[test]
    fn test_stale_output_is_wiped() {
        let project = Project::new();
        project.write("a.txt", b"a");
        fs::create_dir_all(project.dist().join("old")).unwrap();
        fs::write(project.dist().join("old/stale.css"), b"stale").unwrap();

        project.run(&project.config(true)).unwrap();

        assert_eq!(project.listing(), vec!["a.txt"]);
    }

    #[test]
    fn test_empty_source_leaves_empty_output() {
        let project = Project::new();
        fs::create_dir_all(project.cwd.join("site")).unwrap();

        let report = project.run(&project.config(true)).unwrap();

        assert_eq!(report.files, 0);
        assert!(project.dist().is_dir());
        assert!(project.listing().is_empty());
    }

    #[test]
    fn test_protected_output_touches_nothing() {
        let project = Project::new();
        project.write("a.css", b"body{}");
        let config = PrezipConfig {
            output: project.cwd.clone(),
            ..project.config(true)
        };

        let err = project.run(&config).unwrap_err();

        assert!(matches!(err, PipelineError::ProtectedPath { .. }));
        assert!(project.cwd.join("site/a.css").is_file());
    }

    #[test]
    fn test_missing_source_fails_after_clean() {
        let project = Project::new();

        let err = project.run(&project.config(true)).unwrap_err();

        assert!(matches!(err, PipelineError::Traversal { .. }));
        assert!(project.dist().is_dir());
    }

    #[test]
    fn test_failure_stops_later_batches() {
        let project = Project::new();
        for i in 0..25 {
            project.write(&format!("f{i:02}.txt"), b"x");
        }
        let config = PrezipConfig {
            concurrency: 5,
            ..project.config(true)
        };
        let files = scan_source_files(&config.source).unwrap();
        let blocker = config.output.join(files[2].file_name().unwrap());

        prepare_output_dir(&config.output, &config.source, &project.cwd, RetryPolicy::DELETE).unwrap();
        // A directory squatting on a copy target makes that file fail
        fs::create_dir_all(blocker.join("inner")).unwrap();

        let err = process_all(&files, &config, true, || false).unwrap_err();

        assert!(matches!(err, PipelineError::Transform { ref file, .. } if *file == files[2]));
        // Window 0 settled, nothing from window 1 onwards ran
        let written = fs::read_dir(&config.output).unwrap().count();
        assert_eq!(written, 5);
    }

    #[test]
    fn test_interrupt_between_batches() {
        let project = Project::new();
        for i in 0..12 {
            project.write(&format!("f{i:02}.txt"), b"x");
        }
        let config = PrezipConfig {
            concurrency: 4,
            ..project.config(true)
        };
        let polls = AtomicUsize::new(0);

        let err = run_in(&config, &project.cwd, true, || {
            polls.fetch_add(1, Ordering::SeqCst) >= 1
        })
        .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Aborted {
                completed: 4,
                total: 12
            }
        ));
        assert_eq!(project.listing().len(), 4);
    }
}

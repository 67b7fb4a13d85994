//! Run configuration for `prezip.toml`.
//!
//! # Sources
//!
//! Lowest to highest precedence:
//!
//! | Source         | Notes                                              |
//! |----------------|----------------------------------------------------|
//! | defaults       | `PrezipConfig::default()`                          |
//! | `prezip.toml`  | optional; `--config` makes it mandatory            |
//! | CLI flags      | `--source`, `--output`, `--keep-original`, `-j`    |
//!
//! # Example
//!
//! ```toml
//! source = "."
//! output = "dist"
//! compress = [".html", ".css", ".js"]
//! exclude = [".jpg", ".jpeg", ".png", ".gif"]
//! keep_original = true
//! concurrency = 10
//! ```
//!
//! Relative `source`/`output` from a config file (defaulted ones included)
//! resolve against the file's directory. Relative CLI paths, and the defaults
//! when no file is read, resolve against the working directory.
//!
//! After loading, paths are absolute and extensions are lower-cased and
//! dot-prefixed. The value is then passed by reference and never mutated.

mod error;

pub use error::ConfigError;

use crate::{cli::Cli, log, pipeline::DEFAULT_WINDOW, utils::path::normalize_path_in};
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "prezip.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrezipConfig {
    /// Root of the tree to process.
    pub source: PathBuf,

    /// Output root. Wiped and recreated on every run.
    pub output: PathBuf,

    /// Extensions gzipped under a fingerprinted name.
    pub compress: Vec<String>,

    /// Extensions copied verbatim and otherwise left alone.
    pub exclude: Vec<String>,

    /// Also copy every non-excluded file verbatim.
    pub keep_original: bool,

    /// Files processed in parallel per batch window.
    pub concurrency: usize,
}

impl Default for PrezipConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            output: PathBuf::from("dist"),
            compress: [".html", ".css", ".js"].map(String::from).to_vec(),
            exclude: [".jpg", ".jpeg", ".png", ".gif"].map(String::from).to_vec(),
            keep_original: true,
            concurrency: DEFAULT_WINDOW,
        }
    }
}

impl PrezipConfig {
    /// Load configuration from CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_in(cli, &cwd)
    }

    /// Same as [`load`](Self::load) with an explicit working directory.
    fn load_in(cli: &Cli, cwd: &Path) -> Result<Self> {
        let mut config = match Self::resolve_config_path(cli, cwd)? {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                // Paths in the file are relative to the file itself
                config.resolve_paths(path.parent().unwrap_or(cwd));
                config
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.normalize(cwd);
        config.validate()?;
        Ok(config)
    }

    /// Pick the config file to read, if any.
    ///
    /// An explicit `--config` must exist; the default file is optional.
    fn resolve_config_path(cli: &Cli, cwd: &Path) -> Result<Option<PathBuf>> {
        match &cli.config {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    anyhow::bail!("Config file '{}' not found", path.display());
                }
                Ok(Some(path))
            }
            None => {
                let path = cwd.join(DEFAULT_CONFIG_FILE);
                Ok(path.is_file().then_some(path))
            }
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.source, cli.source.as_ref());
        Self::update_option(&mut self.output, cli.output.as_ref());
        Self::update_option(&mut self.keep_original, cli.keep_original.as_ref());
        Self::update_option(&mut self.concurrency, cli.concurrency.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // normalization & validation
    // ========================================================================

    /// Make paths absolute against `cwd` and canonicalize extension spelling.
    pub fn normalize(&mut self, cwd: &Path) {
        self.resolve_paths(cwd);

        for list in [&mut self.compress, &mut self.exclude] {
            let mut seen = FxHashSet::default();
            list.retain_mut(|ext| {
                *ext = normalize_extension(ext);
                seen.insert(ext.clone())
            });
        }
    }

    /// Make `source` and `output` absolute against `base`. Absolute paths are kept.
    fn resolve_paths(&mut self, base: &Path) {
        self.source = normalize_path_in(&self.source, base);
        self.output = normalize_path_in(&self.output, base);
    }

    /// Validate a normalized configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Validation(
                "concurrency must be at least 1".into(),
            ));
        }

        for (field, list) in [("compress", &self.compress), ("exclude", &self.exclude)] {
            if let Some(bad) = list.iter().find(|ext| !is_valid_extension(ext)) {
                return Err(ConfigError::Validation(format!(
                    "invalid extension `{bad}` in `{field}`"
                )));
            }
        }

        let overlap: Vec<_> = self
            .compress
            .iter()
            .filter(|ext| self.exclude.contains(ext))
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            log!("warning"; "listed in both compress and exclude, excluding: {}", overlap.join(", "));
        }

        Ok(())
    }

    /// `ext` is lower-cased and dot-prefixed (or empty).
    pub fn is_excluded(&self, ext: &str) -> bool {
        !ext.is_empty() && self.exclude.iter().any(|e| e == ext)
    }

    /// `ext` is lower-cased and dot-prefixed (or empty).
    pub fn is_compressible(&self, ext: &str) -> bool {
        !ext.is_empty() && self.compress.iter().any(|e| e == ext)
    }
}

/// `"CSS"` / `".css"` / `" .Css "` → `".css"`.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

fn is_valid_extension(ext: &str) -> bool {
    ext.len() > 1 && ext.starts_with('.') && !ext.contains(['/', '\\'])
}

// ============================================================================
// tests
// ============================================================================

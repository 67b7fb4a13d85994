//! Prezip - gzip and fingerprint static assets ahead of deployment.

mod asset;
mod cli;
mod config;
mod core;
mod error;
mod logger;
mod output;
mod pipeline;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::PrezipConfig;

fn main() {
    if let Err(e) = run() {
        logger::report_error(&e.to_string(), &format!("{e:?}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Setup global Ctrl+C handler (before any blocking operations)
    crate::core::setup_shutdown_handler()?;

    let config = PrezipConfig::load(&cli)?;
    debug!("build"; "{} -> {}", config.source.display(), config.output.display());

    let report = pipeline::run(&config, cli.quiet).context("build failed")?;
    debug!(
        "done";
        "clean {}, process {}",
        logger::format_elapsed(report.clean_elapsed),
        logger::format_elapsed(report.process_elapsed)
    );

    Ok(())
}

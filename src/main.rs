use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};

use pdf_compressor::cli::Args;
use pdf_compressor::config::Settings;
use pdf_compressor::job::{spawn, CompressionRequest, Progress};

const BAR_WIDTH: usize = 30;

fn draw_progress(progress: Progress) {
    let filled = progress.percent as usize * BAR_WIDTH / 100;
    let mut stderr = io::stderr().lock();
    let _ = write!(
        stderr,
        "\r[{}{}] {:>3}% {:<24}",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        progress.percent,
        progress.stage
    );
    let _ = stderr.flush();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG still applies on top of -v
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .parse_default_env()
        .init();

    let settings = Settings::from_args(&args);
    settings.validate().context("Invalid settings")?;

    let output_path = args.output_path();
    log::info!(
        "Compressing {} into {}",
        args.input.display(),
        output_path.display()
    );

    let handle = spawn(CompressionRequest {
        input: args.input.clone(),
        output: output_path.clone(),
        settings,
    })
    .context("Failed to start compression job")?;

    let quiet = args.quiet;
    let result = handle.wait_with(|progress| {
        if !quiet {
            draw_progress(progress);
        }
    });
    if !quiet {
        eprintln!();
    }

    let report = result
        .with_context(|| format!("Failed to compress {}", args.input.display()))?;

    println!("{}", report.message());
    println!("{}", report.summary());
    log::info!(
        "{} images: {} recompressed, {} downscaled, {} skipped; metadata removed: {}",
        report.images.total,
        report.images.recompressed,
        report.images.downscaled,
        report.images.skipped,
        report.metadata_removed
    );
    println!("Saved to {}", report.output.display());

    Ok(())
}

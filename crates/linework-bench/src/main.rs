//! linework-bench: CLI tool for preset experimentation and diagnostics.
//!
//! Runs the line-art pipeline on a single image file with a named style or
//! a full JSON configuration, printing per-stage diagnostics. Useful for:
//!
//! - Comparing styles on the same photo
//! - Tuning extractor, cleanup and speckle-filter parameters
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin linework-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use linework_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use linework_pipeline::{LineArtConfig, Style};

/// Line-art preset experimentation and diagnostics for linework.
///
/// Runs the pipeline on a given image and prints detailed per-stage timing
/// and pixel-count diagnostics.
#[derive(Parser)]
#[command(name = "linework-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Style preset (clean, detailed, balanced, artistic, ultra).
    ///
    /// Unknown names fall back to the default style with a warning.
    #[arg(long, default_value_t = Style::DEFAULT.id().to_string())]
    style: String,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, `--style` is ignored. The JSON must be a valid
    /// `LineArtConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the line art as PNG to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// Build a [`LineArtConfig`] from CLI arguments.
fn config_from_cli(cli: &Cli) -> Result<LineArtConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }
    // An unknown name is reported once, by the `warn!` in `Style::resolve`.
    Ok(Style::resolve(&cli.style).style.config())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }
        tracing::info!(run = run + 1, "starting run");

        match linework_pipeline::diagnostics::process_staged_with_diagnostics(
            &image_bytes,
            &config,
            &StdClock,
        ) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the PNG on the first run only.
                if run == 0
                    && let Some(ref output_path) = cli.output
                {
                    match linework_pipeline::encode_png(&staged.output) {
                        Ok(png) => match std::fs::write(output_path, &png) {
                            Ok(()) => {
                                eprintln!(
                                    "PNG written to {} ({} bytes)",
                                    output_path.display(),
                                    png.len(),
                                );
                            }
                            Err(e) => {
                                eprintln!(
                                    "Error writing PNG to {}: {e}",
                                    output_path.display()
                                );
                                return ExitCode::FAILURE;
                            }
                        },
                        Err(e) => {
                            eprintln!("Error encoding PNG: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Option<Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| Some(d.decode.duration)),
        ("Preprocess", |d| Some(d.preprocess.duration)),
        ("Extract (all sources)", |d| {
            Some(d.extract.iter().map(|s| s.duration).sum())
        }),
        ("Combine", |d| Some(d.combine.duration)),
        ("Cleanup", |d| Some(d.cleanup.duration)),
        ("Component Filter", |d| Some(d.component_filter.duration)),
        ("Polarity", |d| Some(d.polarity.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

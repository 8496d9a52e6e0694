//! Pipeline diagnostics: timing, pixel counts, and other metrics for each
//! stage.
//!
//! These diagnostics are permanent instrumentation intended for preset
//! tuning and parameter experimentation. [`process_staged_with_diagnostics`]
//! runs the same stages as [`process_staged`](crate::process_staged) and
//! records a [`StageDiagnostics`] for each one.
//!
//! Time is read through the [`Clock`] trait so callers choose the time
//! source; the bench binary uses [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::binary;
use crate::combine::Combiner;
use crate::edge::EdgeExtractor;
use crate::types::{Dimensions, GrayImage, LineArtConfig, PipelineError, StagedResult};
use crate::{cleanup, components, polarity, preprocess};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A clock that never advances. Every stage reports zero duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClock;

impl Clock for NullClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, (): &()) -> Duration {
        Duration::ZERO
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Grayscale, denoise, bilateral smoothing and CLAHE.
    pub preprocess: StageDiagnostics,
    /// One entry per configured source, in source order.
    pub extract: Vec<StageDiagnostics>,
    /// Merging the source masks.
    pub combine: StageDiagnostics,
    /// Opening, closing, thickness and smoothing.
    pub cleanup: StageDiagnostics,
    /// Speckle removal.
    pub component_filter: StageDiagnostics,
    /// Rendering to black-on-white and polarity normalization.
    pub polarity: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Preprocessing metrics.
    Preprocess {
        /// Whether non-local means denoising ran.
        denoised: bool,
        /// Mean intensity of the preprocessed image.
        mean_intensity: f64,
    },
    /// Metrics for one edge extractor.
    Extract {
        /// Extractor name.
        extractor: String,
        /// Whether the mask was inverted before combining.
        inverted: bool,
        /// Foreground pixels in the (possibly inverted) mask.
        foreground_pixels: u64,
    },
    /// Combiner metrics.
    Combine {
        /// Combining mode.
        mode: String,
        /// Number of input masks.
        inputs: usize,
        /// Foreground pixels in the merged mask.
        foreground_pixels: u64,
    },
    /// Cleanup metrics.
    Cleanup {
        /// Foreground pixels entering cleanup.
        foreground_before: u64,
        /// Foreground pixels after cleanup.
        foreground_after: u64,
    },
    /// Speckle filter metrics.
    ComponentFilter {
        /// Minimum component area in pixels.
        min_area: u64,
        /// Components found before filtering.
        component_count: usize,
        /// Components cleared by the filter.
        removed_count: usize,
        /// Foreground pixels after filtering.
        foreground_pixels: u64,
    },
    /// Polarity metrics.
    Polarity {
        /// Whether the rendered line art was inverted.
        inverted: bool,
        /// Black pixels in the final image.
        ink_pixels: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Black pixels in the final image.
    pub ink_pixels: u64,
    /// Whether polarity normalization inverted the output.
    pub inverted: bool,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        #[allow(clippy::cast_precision_loss)]
        let coverage = if self.summary.pixel_count > 0 {
            self.summary.ink_pixels as f64 / self.summary.pixel_count as f64 * 100.0
        } else {
            0.0
        };
        lines.push(format!(
            "Ink: {} pixels ({coverage:.1}%)  |  Inverted: {}",
            self.summary.ink_pixels, self.summary.inverted,
        ));

        lines.join("\n")
    }

    /// Every stage in execution order, with a display name.
    #[must_use]
    pub fn stages(&self) -> Vec<(String, &StageDiagnostics)> {
        let mut stages = vec![
            ("Decode".to_string(), &self.decode),
            ("Preprocess".to_string(), &self.preprocess),
        ];
        for (i, diag) in self.extract.iter().enumerate() {
            stages.push((format!("Extract #{}", i + 1), diag));
        }
        stages.push(("Combine".to_string(), &self.combine));
        stages.push(("Cleanup".to_string(), &self.cleanup));
        stages.push(("Component Filter".to_string(), &self.component_filter));
        stages.push(("Polarity".to_string(), &self.polarity));
        stages
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Preprocess {
            denoised,
            mean_intensity,
        } => format!("denoised={denoised} mean={mean_intensity:.1}"),
        StageMetrics::Extract {
            extractor,
            inverted,
            foreground_pixels,
        } => {
            let suffix = if *inverted { " (inverted)" } else { "" };
            format!("{extractor}{suffix} fg={foreground_pixels}")
        }
        StageMetrics::Combine {
            mode,
            inputs,
            foreground_pixels,
        } => format!("{mode} of {inputs} fg={foreground_pixels}"),
        StageMetrics::Cleanup {
            foreground_before,
            foreground_after,
        } => format!("fg {foreground_before}->{foreground_after}"),
        StageMetrics::ComponentFilter {
            min_area,
            component_count,
            removed_count,
            foreground_pixels,
        } => format!(
            "min_area={min_area} removed {removed_count}/{component_count} components fg={foreground_pixels}",
        ),
        StageMetrics::Polarity {
            inverted,
            ink_pixels,
        } => format!("inverted={inverted} ink={ink_pixels}"),
    }
}

/// Mean pixel value; zero for an empty image.
#[allow(clippy::cast_precision_loss)]
fn mean_intensity(image: &GrayImage) -> f64 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image.pixels().map(|p| u64::from(p.0[0])).sum();
    sum as f64 / count as f64
}

/// Count black pixels in black-on-white line art.
fn count_ink(line_art: &GrayImage) -> u64 {
    line_art.pixels().map(|p| u64::from(p.0[0] == 0)).sum()
}

const fn combiner_mode(combiner: &Combiner) -> &'static str {
    match combiner {
        Combiner::Or => "or",
        Combiner::Weighted { .. } => "weighted",
    }
}

/// Run `f` and record how long it took.
fn timed<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let out = f();
    (out, clock.elapsed(&start))
}

/// Run the staged pipeline, collecting per-stage diagnostics.
///
/// The configuration is validated before decoding. The returned
/// [`StagedResult`] is identical to what
/// [`process_staged`](crate::process_staged) produces for the same input.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for an invalid
/// configuration, [`PipelineError::EmptyInput`] for empty bytes or a
/// zero-sized image, and [`PipelineError::Decode`] for undecodable bytes.
pub fn process_staged_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    config: &LineArtConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let pipeline_start = clock.now();

    let (decoded, decode_time) = timed(clock, || preprocess::decode(image_bytes));
    let decoded = decoded?;
    let dimensions = crate::checked_dimensions(&decoded)?;
    let decode = StageDiagnostics {
        duration: decode_time,
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
        },
    };

    let (staged, stages) = run_stages(&decoded, dimensions, config, clock)?;

    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        pixel_count: dimensions.pixel_count(),
        ink_pixels: count_ink(&staged.output),
        inverted: staged.inverted,
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        preprocess: stages.preprocess,
        extract: stages.extract,
        combine: stages.combine,
        cleanup: stages.cleanup,
        component_filter: stages.component_filter,
        polarity: stages.polarity,
        total_duration: clock.elapsed(&pipeline_start),
        summary,
    };

    tracing::debug!(
        total_ms = duration_ms(diagnostics.total_duration),
        "pipeline diagnostics collected"
    );

    Ok((staged, diagnostics))
}

/// Diagnostics for the stages after decoding.
pub(crate) struct Stages {
    preprocess: StageDiagnostics,
    extract: Vec<StageDiagnostics>,
    combine: StageDiagnostics,
    cleanup: StageDiagnostics,
    component_filter: StageDiagnostics,
    polarity: StageDiagnostics,
}

/// Run every stage after decoding, keeping each intermediate raster.
///
/// This is the only place the stage order is written down;
/// [`convert`](crate::convert) runs it with [`NullClock`].
pub(crate) fn run_stages<C: Clock>(
    decoded: &DynamicImage,
    dimensions: Dimensions,
    config: &LineArtConfig,
    clock: &C,
) -> Result<(StagedResult, Stages), PipelineError> {
    tracing::info!(
        width = dimensions.width,
        height = dimensions.height,
        sources = config.sources.len(),
        "converting image to line art"
    );

    let (preprocessed, duration) =
        timed(clock, || preprocess::preprocess(decoded, &config.preprocess));
    let preprocess = StageDiagnostics {
        duration,
        metrics: StageMetrics::Preprocess {
            denoised: config.preprocess.denoise.is_some(),
            mean_intensity: mean_intensity(&preprocessed),
        },
    };

    let mut edges = Vec::with_capacity(config.sources.len());
    let mut extract = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let (mask, duration) = timed(clock, || source.extract(&preprocessed));
        let foreground_pixels = binary::count_foreground(&mask);
        tracing::debug!(
            extractor = source.extractor.name(),
            inverted = source.invert,
            foreground_pixels,
            "source extracted"
        );
        extract.push(StageDiagnostics {
            duration,
            metrics: StageMetrics::Extract {
                extractor: source.extractor.name().to_string(),
                inverted: source.invert,
                foreground_pixels,
            },
        });
        edges.push(mask);
    }

    let (combined, duration) = timed(clock, || config.combiner.combine(&edges));
    let combined = combined?;
    let combined_foreground = binary::count_foreground(&combined);
    let combine = StageDiagnostics {
        duration,
        metrics: StageMetrics::Combine {
            mode: combiner_mode(&config.combiner).to_string(),
            inputs: edges.len(),
            foreground_pixels: combined_foreground,
        },
    };

    let (cleaned, duration) = timed(clock, || cleanup::clean_lines(&combined, &config.cleanup));
    let cleanup = StageDiagnostics {
        duration,
        metrics: StageMetrics::Cleanup {
            foreground_before: combined_foreground,
            foreground_after: binary::count_foreground(&cleaned),
        },
    };

    let min_area = config.components.min_area;
    let ((filtered, found), duration) = timed(clock, || {
        let found = components::component_areas(&cleaned);
        (components::remove_small_components(&cleaned, min_area), found)
    });
    let component_filter = StageDiagnostics {
        duration,
        metrics: StageMetrics::ComponentFilter {
            min_area,
            component_count: found.len(),
            removed_count: if min_area <= 1 {
                0
            } else {
                found.iter().filter(|c| c.area < min_area).count()
            },
            foreground_pixels: binary::count_foreground(&filtered),
        },
    };

    let ((line_art, (output, inverted)), duration) = timed(clock, || {
        let line_art = polarity::render_line_art(&filtered);
        let normalized = polarity::normalize_polarity(&line_art);
        (line_art, normalized)
    });
    let polarity = StageDiagnostics {
        duration,
        metrics: StageMetrics::Polarity {
            inverted,
            ink_pixels: count_ink(&output),
        },
    };

    let staged = StagedResult {
        original: decoded.to_rgba8(),
        preprocessed,
        edges,
        combined,
        cleaned,
        filtered,
        line_art,
        output,
        inverted,
        dimensions,
    };

    let stages = Stages {
        preprocess,
        extract,
        combine,
        cleanup,
        component_filter,
        polarity,
    };
    Ok((staged, stages))
}

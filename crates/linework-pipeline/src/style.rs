//! Named style presets.
//!
//! Each preset is plain data: which extractors feed the combiner, how
//! they are merged, and how hard cleanup and speckle filtering work.
//! [`Style::config`] is a pure lookup; nothing here is mutated at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupParams;
use crate::combine::{Combiner, Source};
use crate::components::ComponentFilterParams;
use crate::edge::{DogParams, Extractor, GradientParams, LaplacianParams, MultiScaleParams};
use crate::preprocess::{NlMeansParams, PreprocessParams};
use crate::types::{LineArtConfig, PipelineError};

/// A named line-art style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Sparse stylized strokes from a single difference of Gaussians.
    Clean,
    /// Multi-scale Canny OR gradient magnitude; keeps fine detail.
    Detailed,
    /// Multi-scale Canny blended 0.7 / 0.3 with the Laplacian.
    Balanced,
    /// A softer, wider difference of Gaussians for a sketch look.
    Artistic,
    /// Non-local means denoise, then inverted DoG OR multi-scale Canny.
    #[default]
    Ultra,
}

/// Outcome of [`Style::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// The style that will be used.
    pub style: Style,
    /// `true` when the requested id was unknown and the default was used.
    pub fallback: bool,
}

impl Style {
    /// Every preset, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Clean,
        Self::Detailed,
        Self::Balanced,
        Self::Artistic,
        Self::Ultra,
    ];

    /// Preset used for unknown ids.
    pub const DEFAULT: Self = Self::Ultra;

    /// Lowercase identifier.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Detailed => "detailed",
            Self::Balanced => "balanced",
            Self::Artistic => "artistic",
            Self::Ultra => "ultra",
        }
    }

    /// Look up a style id, falling back to [`Style::DEFAULT`].
    ///
    /// The fallback is logged at `warn` level and reported through
    /// [`Resolved::fallback`].
    #[must_use]
    pub fn resolve(id: &str) -> Resolved {
        id.parse().map_or_else(
            |_| {
                tracing::warn!(
                    requested = id,
                    fallback = Self::DEFAULT.id(),
                    "unknown style, using default"
                );
                Resolved {
                    style: Self::DEFAULT,
                    fallback: true,
                }
            },
            |style| Resolved {
                style,
                fallback: false,
            },
        )
    }

    /// The full pipeline configuration for this preset.
    #[must_use]
    pub fn config(self) -> LineArtConfig {
        let standard_cleanup = CleanupParams::default();
        let standard_filter = ComponentFilterParams::default();
        match self {
            Self::Clean => LineArtConfig {
                preprocess: PreprocessParams::default(),
                sources: vec![Source::new(Extractor::Dog(DogParams {
                    sigma: 0.4,
                    k: 1.4,
                    p: 25.0,
                    ..DogParams::default()
                }))],
                combiner: Combiner::Or,
                cleanup: standard_cleanup,
                components: standard_filter,
            },
            Self::Detailed => LineArtConfig {
                preprocess: PreprocessParams::default(),
                sources: vec![
                    Source::new(Extractor::MultiScale(MultiScaleParams::default())),
                    Source::new(Extractor::Gradient(GradientParams::default())),
                ],
                combiner: Combiner::Or,
                cleanup: standard_cleanup,
                components: standard_filter,
            },
            Self::Balanced => LineArtConfig {
                preprocess: PreprocessParams::default(),
                sources: vec![
                    Source::new(Extractor::MultiScale(MultiScaleParams::default())),
                    Source::new(Extractor::Laplacian(LaplacianParams::default())),
                ],
                combiner: Combiner::Weighted {
                    weights: vec![0.7, 0.3],
                },
                cleanup: standard_cleanup,
                components: standard_filter,
            },
            Self::Artistic => LineArtConfig {
                preprocess: PreprocessParams::default(),
                sources: vec![Source::new(Extractor::Dog(DogParams {
                    sigma: 0.6,
                    k: 2.0,
                    p: 30.0,
                    phi: 0.5,
                    ..DogParams::default()
                }))],
                combiner: Combiner::Or,
                cleanup: standard_cleanup,
                components: standard_filter,
            },
            Self::Ultra => LineArtConfig {
                preprocess: PreprocessParams {
                    denoise: Some(NlMeansParams::default()),
                    ..PreprocessParams::default()
                },
                sources: vec![
                    Source::inverted(Extractor::Dog(DogParams {
                        p: 22.0,
                        ..DogParams::default()
                    })),
                    Source::new(Extractor::MultiScale(MultiScaleParams::default())),
                ],
                combiner: Combiner::Or,
                cleanup: CleanupParams {
                    open_kernel: 1,
                    close_kernel: 2,
                    line_thickness: 1,
                    ..CleanupParams::default()
                },
                components: ComponentFilterParams { min_area: 40 },
            },
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Style {
    type Err = PipelineError;

    /// Strict parse of a lowercase style id, ignoring surrounding
    /// whitespace and ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PipelineError::InvalidParameter(format!("unknown style: {s:?}")))
    }
}

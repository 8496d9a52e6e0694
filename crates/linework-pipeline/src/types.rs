//! Shared types for the linework pipeline.

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupParams;
use crate::combine::{Combiner, Source};
use crate::components::ComponentFilterParams;
use crate::edge::EdgeExtractor;
use crate::preprocess::PreprocessParams;
use crate::style::Style;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// original decoded image without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a gray grid.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Configuration for one line-art conversion.
///
/// Usually obtained from [`Style::config`]; any field may be edited or the
/// whole record loaded from JSON. [`validate`](Self::validate) runs before
/// any pixel is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineArtConfig {
    /// Grayscale, denoise and contrast settings.
    pub preprocess: PreprocessParams,
    /// Edge extractors feeding the combiner, in order.
    pub sources: Vec<Source>,
    /// How the source masks are merged.
    pub combiner: Combiner,
    /// Morphological cleanup of the merged mask.
    pub cleanup: CleanupParams,
    /// Speckle filtering after cleanup.
    pub components: ComponentFilterParams,
}

impl LineArtConfig {
    /// Check every stage's parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError::InvalidParameter`] found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.preprocess.validate()?;
        for source in &self.sources {
            source.extractor.validate()?;
        }
        self.combiner.validate(self.sources.len())?;
        self.cleanup.validate()?;
        self.components.validate()
    }
}

impl Default for LineArtConfig {
    fn default() -> Self {
        Style::DEFAULT.config()
    }
}

/// Output of [`process`](crate::process).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Black-on-white line art.
    pub image: GrayImage,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Every intermediate raster from one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResult {
    /// Original decoded image.
    pub original: RgbaImage,
    /// Grayscale after denoise, bilateral smoothing and CLAHE.
    pub preprocessed: GrayImage,
    /// One mask per source, after optional inversion, in source order.
    pub edges: Vec<GrayImage>,
    /// Combiner output.
    pub combined: GrayImage,
    /// Mask after morphological cleanup.
    pub cleaned: GrayImage,
    /// Mask after the speckle filter.
    pub filtered: GrayImage,
    /// Filtered mask rendered black-on-white.
    pub line_art: GrayImage,
    /// Final image after polarity normalization.
    pub output: GrayImage,
    /// Whether polarity normalization inverted `line_art`.
    pub inverted: bool,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Serde-compatible proxy for `StagedResult`.
///
/// Raster images are represented as `(width, height, raw_pixel_bytes)`
/// tuples since `image::ImageBuffer` does not implement serde traits.
#[derive(Serialize, Deserialize)]
struct StagedResultProxy {
    original: (u32, u32, Vec<u8>),
    preprocessed: (u32, u32, Vec<u8>),
    edges: Vec<(u32, u32, Vec<u8>)>,
    combined: (u32, u32, Vec<u8>),
    cleaned: (u32, u32, Vec<u8>),
    filtered: (u32, u32, Vec<u8>),
    line_art: (u32, u32, Vec<u8>),
    output: (u32, u32, Vec<u8>),
    inverted: bool,
    dimensions: Dimensions,
}

fn gray_raw(image: &GrayImage) -> (u32, u32, Vec<u8>) {
    (image.width(), image.height(), image.as_raw().clone())
}

fn gray_from_raw<E: serde::de::Error>(
    (width, height, raw): (u32, u32, Vec<u8>),
    stage: &str,
) -> Result<GrayImage, E> {
    GrayImage::from_raw(width, height, raw)
        .ok_or_else(|| E::custom(format!("invalid {stage} image dimensions")))
}

impl Serialize for StagedResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = StagedResultProxy {
            original: (
                self.original.width(),
                self.original.height(),
                self.original.as_raw().clone(),
            ),
            preprocessed: gray_raw(&self.preprocessed),
            edges: self.edges.iter().map(gray_raw).collect(),
            combined: gray_raw(&self.combined),
            cleaned: gray_raw(&self.cleaned),
            filtered: gray_raw(&self.filtered),
            line_art: gray_raw(&self.line_art),
            output: gray_raw(&self.output),
            inverted: self.inverted,
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StagedResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = StagedResultProxy::deserialize(deserializer)?;

        let original = RgbaImage::from_raw(proxy.original.0, proxy.original.1, proxy.original.2)
            .ok_or_else(|| serde::de::Error::custom("invalid RGBA image dimensions"))?;
        let edges = proxy
            .edges
            .into_iter()
            .map(|raw| gray_from_raw(raw, "edges"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            original,
            preprocessed: gray_from_raw(proxy.preprocessed, "preprocessed")?,
            edges,
            combined: gray_from_raw(proxy.combined, "combined")?,
            cleaned: gray_from_raw(proxy.cleaned, "cleaned")?,
            filtered: gray_from_raw(proxy.filtered, "filtered")?,
            line_art: gray_from_raw(proxy.line_art, "line_art")?,
            output: gray_from_raw(proxy.output, "output")?,
            inverted: proxy.inverted,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// A configuration value is out of range or inconsistent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input bytes were empty or the image has a zero dimension.
    #[error("input image is empty")]
    EmptyInput,

    /// The output image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::edge::{Extractor, GradientParams};

    // --- Dimensions tests ---

    #[test]
    fn dimensions_of_image() {
        let dims = Dimensions::of(&GrayImage::new(12, 7));
        assert_eq!(
            dims,
            Dimensions {
                width: 12,
                height: 7
            }
        );
        assert_eq!(dims.pixel_count(), 84);
        assert!(!dims.is_empty());
        assert!(Dimensions::of(&GrayImage::new(0, 7)).is_empty());
    }

    // --- LineArtConfig tests ---

    #[test]
    fn default_config_is_default_style() {
        assert_eq!(LineArtConfig::default(), Style::DEFAULT.config());
        assert!(LineArtConfig::default().validate().is_ok());
    }

    #[test]
    fn config_serde_round_trip() {
        for style in Style::ALL {
            let config = style.config();
            let json = serde_json::to_string(&config).unwrap();
            let back: LineArtConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(back, config, "{style}");
        }
    }

    #[test]
    fn config_with_no_sources_is_invalid() {
        let config = LineArtConfig {
            sources: vec![],
            ..LineArtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn config_with_mismatched_weights_is_invalid() {
        let config = LineArtConfig {
            sources: vec![Source::new(Extractor::Gradient(GradientParams::default()))],
            combiner: Combiner::Weighted {
                weights: vec![0.5, 0.5],
            },
            ..LineArtConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_zero_cleanup_kernel_is_invalid() {
        let config = LineArtConfig {
            cleanup: CleanupParams {
                close_kernel: 0,
                ..CleanupParams::default()
            },
            ..LineArtConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_zero_min_area_is_invalid() {
        let config = LineArtConfig {
            components: ComponentFilterParams { min_area: 0 },
            ..LineArtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn config_with_oversized_clahe_grid_is_invalid() {
        let mut config = LineArtConfig::default();
        config.preprocess.clahe.tile_grid = u32::MAX;
        assert!(config.validate().is_err());
    }

    // --- PipelineError tests ---

    #[test]
    fn error_messages() {
        assert_eq!(PipelineError::EmptyInput.to_string(), "input image is empty");
        assert_eq!(
            PipelineError::InvalidParameter("bad value".to_string()).to_string(),
            "invalid parameter: bad value"
        );
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
        assert_send_sync::<LineArtConfig>();
        assert_send_sync::<StagedResult>();
    }

    // --- StagedResult serde ---

    #[test]
    fn staged_result_serde_round_trip() {
        let gray = GrayImage::from_fn(3, 2, |x, y| image::Luma([(x * 10 + y) as u8]));
        let staged = StagedResult {
            original: RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255])),
            preprocessed: gray.clone(),
            edges: vec![gray.clone(), GrayImage::new(3, 2)],
            combined: gray.clone(),
            cleaned: gray.clone(),
            filtered: gray.clone(),
            line_art: gray.clone(),
            output: gray,
            inverted: true,
            dimensions: Dimensions {
                width: 3,
                height: 2,
            },
        };
        let json = serde_json::to_string(&staged).unwrap();
        let back: StagedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, staged);
    }

    #[test]
    fn staged_result_rejects_bad_raster() {
        let json = r#"{"original":[1,1,[0,0,0,0]],"preprocessed":[2,2,[0]],"edges":[],
            "combined":[1,1,[0]],"cleaned":[1,1,[0]],"filtered":[1,1,[0]],
            "line_art":[1,1,[0]],"output":[1,1,[0]],"inverted":false,
            "dimensions":{"width":1,"height":1}}"#;
        assert!(serde_json::from_str::<StagedResult>(json).is_err());
    }
}

//! Edge extractors: turn a preprocessed gray grid into a binary edge mask.
//!
//! Every extractor is described by a parameter record implementing
//! [`EdgeExtractor`]. The [`Extractor`] enum wraps them so style presets
//! and JSON configs can pick extractors as data.
//!
//! # Strategy pattern
//!
//! The four extractors respond to different image features. Multi-scale
//! Canny finds crisp thin boundaries, gradient magnitude finds soft wide
//! ones, the Laplacian is orientation-free and the difference of
//! Gaussians gives stylized strokes. Presets mix them through the
//! [`combine`](crate::combine) stage rather than through per-style code.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;
use serde::{Deserialize, Serialize};

use crate::binary::{self, BACKGROUND, FOREGROUND};
use crate::blur::{self, FloatImage};
use crate::canny::{self, Gradients};
use crate::types::PipelineError;

/// Trait for edge extraction strategies.
///
/// Input: a preprocessed gray grid. Output: a binary mask of the same
/// shape where [`FOREGROUND`] marks edge pixels.
pub trait EdgeExtractor {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Check the parameters without running the extractor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] describing the first
    /// offending value.
    fn validate(&self) -> Result<(), PipelineError>;

    /// Extract the edge mask.
    fn extract(&self, image: &GrayImage) -> GrayImage;
}

/// Selects an edge extractor and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extractor {
    /// Canny at several blur scales and threshold pairs, OR-ed together.
    MultiScale(MultiScaleParams),
    /// Normalized Sobel magnitude with a fixed cutoff.
    Gradient(GradientParams),
    /// Normalized absolute Laplacian with a fixed cutoff.
    Laplacian(LaplacianParams),
    /// Extended difference of Gaussians with a soft threshold.
    Dog(DogParams),
}

impl EdgeExtractor for Extractor {
    fn name(&self) -> &'static str {
        match self {
            Self::MultiScale(p) => p.name(),
            Self::Gradient(p) => p.name(),
            Self::Laplacian(p) => p.name(),
            Self::Dog(p) => p.name(),
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        match self {
            Self::MultiScale(p) => p.validate(),
            Self::Gradient(p) => p.validate(),
            Self::Laplacian(p) => p.validate(),
            Self::Dog(p) => p.validate(),
        }
    }

    fn extract(&self, image: &GrayImage) -> GrayImage {
        match self {
            Self::MultiScale(p) => p.extract(image),
            Self::Gradient(p) => p.extract(image),
            Self::Laplacian(p) => p.extract(image),
            Self::Dog(p) => p.extract(image),
        }
    }
}

/// A Canny hysteresis threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CannyThresholds {
    /// Pixels above this extend an existing edge.
    pub low: f32,
    /// Pixels above this start a new edge.
    pub high: f32,
}

impl CannyThresholds {
    /// Create a threshold pair.
    #[must_use]
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }
}

/// Parameters for the multi-scale Canny extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiScaleParams {
    /// Gaussian kernel sizes, one blur per entry. Even sizes are rounded
    /// up to the next odd size.
    pub blur_kernels: Vec<u32>,
    /// Threshold pairs run at every blur scale.
    pub thresholds: Vec<CannyThresholds>,
}

impl MultiScaleParams {
    /// Default blur kernel sizes.
    pub const DEFAULT_BLUR_KERNELS: [u32; 3] = [3, 5, 7];

    /// Default Canny threshold pairs, from fine to coarse.
    pub const DEFAULT_THRESHOLDS: [CannyThresholds; 3] = [
        CannyThresholds::new(20.0, 80.0),
        CannyThresholds::new(40.0, 120.0),
        CannyThresholds::new(60.0, 160.0),
    ];
}

impl Default for MultiScaleParams {
    fn default() -> Self {
        Self {
            blur_kernels: Self::DEFAULT_BLUR_KERNELS.to_vec(),
            thresholds: Self::DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl EdgeExtractor for MultiScaleParams {
    fn name(&self) -> &'static str {
        "multi_scale"
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.blur_kernels.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "multi_scale: blur_kernels must not be empty".to_string(),
            ));
        }
        if self.blur_kernels.contains(&0) {
            return Err(PipelineError::InvalidParameter(
                "multi_scale: blur kernel size must be at least 1".to_string(),
            ));
        }
        if self.thresholds.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "multi_scale: thresholds must not be empty".to_string(),
            ));
        }
        for t in &self.thresholds {
            if !t.low.is_finite() || !t.high.is_finite() {
                return Err(PipelineError::InvalidParameter(format!(
                    "multi_scale: thresholds must be finite, got ({}, {})",
                    t.low, t.high,
                )));
            }
        }
        Ok(())
    }

    fn extract(&self, image: &GrayImage) -> GrayImage {
        multi_scale(image, self)
    }
}

/// Parameters for the gradient-magnitude extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientParams {
    /// Normalized magnitudes strictly above this become edges.
    pub cutoff: u8,
}

impl GradientParams {
    /// Default cutoff on the 0-255 normalized magnitude.
    pub const DEFAULT_CUTOFF: u8 = 30;
}

impl Default for GradientParams {
    fn default() -> Self {
        Self {
            cutoff: Self::DEFAULT_CUTOFF,
        }
    }
}

impl EdgeExtractor for GradientParams {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn validate(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn extract(&self, image: &GrayImage) -> GrayImage {
        gradient_magnitude(image, self)
    }
}

/// Parameters for the second-derivative extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaplacianParams {
    /// Gaussian kernel size applied before the Laplacian.
    pub blur_kernel: u32,
    /// Normalized responses strictly above this become edges.
    pub cutoff: u8,
}

impl LaplacianParams {
    /// Default pre-blur kernel size.
    pub const DEFAULT_BLUR_KERNEL: u32 = 3;
    /// Default cutoff on the 0-255 normalized response.
    pub const DEFAULT_CUTOFF: u8 = 20;
}

impl Default for LaplacianParams {
    fn default() -> Self {
        Self {
            blur_kernel: Self::DEFAULT_BLUR_KERNEL,
            cutoff: Self::DEFAULT_CUTOFF,
        }
    }
}

impl EdgeExtractor for LaplacianParams {
    fn name(&self) -> &'static str {
        "laplacian"
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.blur_kernel == 0 {
            return Err(PipelineError::InvalidParameter(
                "laplacian: blur_kernel must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn extract(&self, image: &GrayImage) -> GrayImage {
        laplacian(image, self)
    }
}

/// Parameters for the extended difference-of-Gaussians extractor.
///
/// Lower `sigma` and higher `p`/`phi` give sparser, more stylized lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DogParams {
    /// Standard deviation of the narrow blur.
    pub sigma: f32,
    /// Ratio of the wide blur's sigma to the narrow one.
    pub k: f32,
    /// Weight of the wide blur in `G(sigma) - p * G(sigma * k)`.
    pub p: f32,
    /// Responses at or above this are fully white.
    pub epsilon: f32,
    /// Steepness of the `tanh` roll-off below `epsilon`.
    pub phi: f32,
    /// Rescaled responses strictly above this become edges.
    pub threshold: u8,
}

impl DogParams {
    /// Default narrow sigma.
    pub const DEFAULT_SIGMA: f32 = 0.5;
    /// Default sigma ratio.
    pub const DEFAULT_K: f32 = 1.6;
    /// Default wide-blur weight.
    pub const DEFAULT_P: f32 = 20.0;
    /// Default soft-threshold knee.
    pub const DEFAULT_EPSILON: f32 = 0.01;
    /// Default roll-off steepness.
    pub const DEFAULT_PHI: f32 = 1.0;
    /// Default binarization cutoff, near the white end.
    pub const DEFAULT_THRESHOLD: u8 = 200;
}

impl Default for DogParams {
    fn default() -> Self {
        Self {
            sigma: Self::DEFAULT_SIGMA,
            k: Self::DEFAULT_K,
            p: Self::DEFAULT_P,
            epsilon: Self::DEFAULT_EPSILON,
            phi: Self::DEFAULT_PHI,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl EdgeExtractor for DogParams {
    fn name(&self) -> &'static str {
        "dog"
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "dog: sigma must be positive and finite, got {}",
                self.sigma,
            )));
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "dog: k must be positive and finite, got {}",
                self.k,
            )));
        }
        for (name, value) in [("p", self.p), ("epsilon", self.epsilon), ("phi", self.phi)] {
            if !value.is_finite() {
                return Err(PipelineError::InvalidParameter(format!(
                    "dog: {name} must be finite, got {value}",
                )));
            }
        }
        Ok(())
    }

    fn extract(&self, image: &GrayImage) -> GrayImage {
        difference_of_gaussians(image, self)
    }
}

/// Multi-scale Canny: blur at each kernel size, run every threshold pair,
/// OR all results.
#[must_use = "returns the binary edge mask"]
pub fn multi_scale(image: &GrayImage, params: &MultiScaleParams) -> GrayImage {
    let mut combined = GrayImage::new(image.width(), image.height());
    for &size in &params.blur_kernels {
        let blurred = blur::gaussian_blur_sized(image, size);
        let gradients = Gradients::new(&blurred);
        for t in &params.thresholds {
            binary::union_into(&mut combined, &gradients.hysteresis(t.low, t.high));
        }
    }
    combined
}

/// Euclidean Sobel magnitude, normalized by its maximum, binarized.
#[must_use = "returns the binary edge mask"]
pub fn gradient_magnitude(image: &GrayImage, params: &GradientParams) -> GrayImage {
    let (gx, gy) = canny::sobel(image);
    let magnitude = FloatImage::from_fn(image.width(), image.height(), |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.hypot(v)])
    });
    binary::threshold(&normalize_by_max(&magnitude), params.cutoff)
}

/// Absolute Laplacian of a lightly blurred image, normalized, binarized.
#[must_use = "returns the binary edge mask"]
pub fn laplacian(image: &GrayImage, params: &LaplacianParams) -> GrayImage {
    let blurred = blur::gaussian_blur_sized(image, params.blur_kernel);
    let response: Image<Luma<i16>> = filter_clamped(&blurred, kernel::LAPLACIAN_3X3);
    let magnitude = FloatImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([f32::from(response.get_pixel(x, y).0[0].unsigned_abs())])
    });
    binary::threshold(&normalize_by_max(&magnitude), params.cutoff)
}

/// Extended difference of Gaussians.
///
/// On intensities in `[0, 1]`, computes `dog = G(sigma) - p * G(sigma * k)`
/// and maps it through [`soft_threshold`]. The result is scaled to 0-255
/// (truncating) and pixels strictly above `params.threshold` become
/// foreground.
#[must_use = "returns the binary edge mask"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn difference_of_gaussians(image: &GrayImage, params: &DogParams) -> GrayImage {
    let unit = blur::to_unit_float(image);
    let narrow = blur::gaussian_blur_float(&unit, params.sigma);
    let wide = blur::gaussian_blur_float(&unit, params.sigma * params.k);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let dog = params
            .p
            .mul_add(-wide.get_pixel(x, y).0[0], narrow.get_pixel(x, y).0[0]);
        let scaled = (soft_threshold(dog, params.epsilon, params.phi) * 255.0) as u8;
        Luma([if scaled > params.threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }])
    })
}

/// XDoG soft threshold: `1` at or above `epsilon`, otherwise
/// `1 + tanh(phi * (value - epsilon))`.
#[must_use]
pub fn soft_threshold(value: f32, epsilon: f32, phi: f32) -> f32 {
    if value >= epsilon {
        1.0
    } else {
        1.0 + (phi * (value - epsilon)).tanh()
    }
}

/// Scale a non-negative response so its maximum maps to 255 (truncating).
///
/// A zero maximum (uniform input) yields an all-zero grid.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_by_max(response: &FloatImage) -> GrayImage {
    let max = response.pixels().map(|p| p.0[0]).fold(0.0f32, f32::max);
    if max <= 0.0 {
        return GrayImage::new(response.width(), response.height());
    }
    GrayImage::from_fn(response.width(), response.height(), |x, y| {
        Luma([(response.get_pixel(x, y).0[0] / max * 255.0) as u8])
    })
}

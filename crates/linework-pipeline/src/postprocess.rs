//! Pure black-and-white cleanup for images that are already line art.
//!
//! Generated or scanned coloring pages tend to carry gray antialiasing, a
//! tinted page or a dark backdrop. [`pure_black_and_white`] thresholds
//! them to exact black on white and fixes polarity from the corners, then
//! optionally adjusts stroke weight and removes specks. No edge detection
//! runs here; the input's own strokes become the output's strokes.

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};

use crate::types::PipelineError;
use crate::{binary, blur, cleanup, morphology, polarity, preprocess};

/// Kernel size of the pre-threshold blur.
const DENOISE_BLUR_KERNEL: u32 = 3;
/// Element side of the post-threshold speck removal.
const DENOISE_ELEMENT: u32 = 2;
/// Element side of one thickness step.
const THICKNESS_ELEMENT: u32 = 3;

/// Parameters for [`pure_black_and_white`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PureBwParams {
    /// Pixels brighter than this become page; the rest become ink.
    pub threshold: u8,
    /// Stroke weight change in 3x3 steps. Positive thickens, negative
    /// thins.
    pub thickness_adjust: i32,
    /// Blur before thresholding and remove specks and pinholes after.
    pub denoise: bool,
    /// Invert when the corners say the page came out dark.
    pub fix_polarity: bool,
}

impl PureBwParams {
    /// Default page threshold.
    pub const DEFAULT_THRESHOLD: u8 = 200;
    /// Default stroke weight change.
    pub const DEFAULT_THICKNESS_ADJUST: i32 = 0;
    /// Largest accepted stroke weight change in either direction.
    pub const MAX_THICKNESS_ADJUST: i32 = 2;

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if `thickness_adjust`
    /// is outside `-MAX_THICKNESS_ADJUST..=MAX_THICKNESS_ADJUST`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.thickness_adjust.unsigned_abs() > Self::MAX_THICKNESS_ADJUST.unsigned_abs() {
            return Err(PipelineError::InvalidParameter(format!(
                "pure_bw: thickness_adjust must be within ±{}, got {}",
                Self::MAX_THICKNESS_ADJUST,
                self.thickness_adjust,
            )));
        }
        Ok(())
    }
}

impl Default for PureBwParams {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            thickness_adjust: Self::DEFAULT_THICKNESS_ADJUST,
            denoise: true,
            fix_polarity: true,
        }
    }
}

/// Force a drawing to exact black ink on a white page.
///
/// Runs grayscale, optional blur, threshold, corner polarity check,
/// thickness adjustment and optional speck removal, in that order.
/// Parameters are assumed valid; see [`PureBwParams::validate`].
#[must_use = "returns the black-and-white page"]
pub fn pure_black_and_white(image: &DynamicImage, params: &PureBwParams) -> GrayImage {
    let mut gray = preprocess::to_grayscale(image);
    if params.denoise {
        gray = blur::gaussian_blur_sized(&gray, DENOISE_BLUR_KERNEL);
    }

    let mut page = binary::threshold(&gray, params.threshold);
    if params.fix_polarity {
        let (normalized, inverted) = polarity::normalize_polarity(&page);
        tracing::debug!(inverted, "pure black-and-white polarity checked");
        page = normalized;
    }

    let mut ink = cleanup::adjust_thickness(
        &binary::invert(&page),
        params.thickness_adjust,
        THICKNESS_ELEMENT,
    );
    if params.denoise {
        let despeckled = morphology::open(&ink, DENOISE_ELEMENT);
        ink = morphology::close(&despeckled, DENOISE_ELEMENT);
    }
    polarity::render_line_art(&ink)
}

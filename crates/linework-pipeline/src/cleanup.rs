//! Line cleanup: speckle removal, gap bridging, stroke weight and
//! anti-staircase smoothing.
//!
//! Steps run in a fixed order: open, close, thickness, smooth.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::binary::{self, MIDPOINT};
use crate::blur;
use crate::morphology;
use crate::types::PipelineError;

/// Stroke thickness that needs no adjustment.
pub const BASE_THICKNESS: i32 = 1;

/// Parameters for [`clean_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupParams {
    /// Side of the opening element.
    pub open_kernel: u32,
    /// Side of the closing element.
    pub close_kernel: u32,
    /// Requested stroke thickness. Above [`BASE_THICKNESS`] dilates, below
    /// erodes, one iteration per step of difference.
    pub line_thickness: i32,
    /// Side of the element used for thickness adjustment.
    pub thickness_kernel: u32,
    /// Gaussian kernel size of the final smoothing pass.
    pub smooth_kernel: u32,
}

impl CleanupParams {
    /// Default opening element side.
    pub const DEFAULT_OPEN_KERNEL: u32 = 2;
    /// Default closing element side.
    pub const DEFAULT_CLOSE_KERNEL: u32 = 3;
    /// Default stroke thickness.
    pub const DEFAULT_LINE_THICKNESS: i32 = 2;
    /// Default thickness element side.
    pub const DEFAULT_THICKNESS_KERNEL: u32 = 2;
    /// Default smoothing kernel size.
    pub const DEFAULT_SMOOTH_KERNEL: u32 = 3;

    /// Signed number of dilation (positive) or erosion (negative) steps.
    #[must_use]
    pub const fn thickness_delta(&self) -> i32 {
        self.line_thickness - BASE_THICKNESS
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for a negative
    /// thickness, any zero kernel size, or a morphology element larger than
    /// [`morphology::MAX_ELEMENT_SIZE`].
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.line_thickness < 0 {
            return Err(PipelineError::InvalidParameter(format!(
                "cleanup: line_thickness must not be negative, got {}",
                self.line_thickness,
            )));
        }
        for (name, size) in [
            ("open_kernel", self.open_kernel),
            ("close_kernel", self.close_kernel),
            ("thickness_kernel", self.thickness_kernel),
            ("smooth_kernel", self.smooth_kernel),
        ] {
            if size == 0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "cleanup: {name} must be at least 1",
                )));
            }
        }
        for (name, size) in [
            ("open_kernel", self.open_kernel),
            ("close_kernel", self.close_kernel),
            ("thickness_kernel", self.thickness_kernel),
        ] {
            if size > morphology::MAX_ELEMENT_SIZE {
                return Err(PipelineError::InvalidParameter(format!(
                    "cleanup: {name} must be at most {}, got {size}",
                    morphology::MAX_ELEMENT_SIZE,
                )));
            }
        }
        Ok(())
    }
}

impl Default for CleanupParams {
    fn default() -> Self {
        Self {
            open_kernel: Self::DEFAULT_OPEN_KERNEL,
            close_kernel: Self::DEFAULT_CLOSE_KERNEL,
            line_thickness: Self::DEFAULT_LINE_THICKNESS,
            thickness_kernel: Self::DEFAULT_THICKNESS_KERNEL,
            smooth_kernel: Self::DEFAULT_SMOOTH_KERNEL,
        }
    }
}

/// Run open, close, thickness adjustment and smoothing on a binary mask.
///
/// Parameters are assumed valid; see [`CleanupParams::validate`].
#[must_use = "returns the cleaned mask"]
pub fn clean_lines(mask: &GrayImage, params: &CleanupParams) -> GrayImage {
    let opened = morphology::open(mask, params.open_kernel);
    let closed = morphology::close(&opened, params.close_kernel);
    let adjusted = adjust_thickness(&closed, params.thickness_delta(), params.thickness_kernel);
    smooth(&adjusted, params.smooth_kernel)
}

/// Dilate (`delta > 0`) or erode (`delta < 0`) `|delta|` times.
#[must_use = "returns the adjusted mask"]
pub fn adjust_thickness(mask: &GrayImage, delta: i32, kernel: u32) -> GrayImage {
    let step: fn(&GrayImage, u32) -> GrayImage = if delta > 0 {
        morphology::dilate
    } else {
        morphology::erode
    };
    let mut out = mask.clone();
    for _ in 0..delta.unsigned_abs() {
        out = step(&out, kernel);
    }
    out
}

/// Blur then re-binarize at the midpoint.
#[must_use = "returns the smoothed mask"]
pub fn smooth(mask: &GrayImage, kernel: u32) -> GrayImage {
    binary::threshold(&blur::gaussian_blur_sized(mask, kernel), MIDPOINT)
}

//! Binary mask primitives.
//!
//! A binary mask is a [`GrayImage`] whose pixels are exactly
//! [`BACKGROUND`] (0) or [`FOREGROUND`] (255). Every stage that claims to
//! produce a mask goes through [`threshold`] or one of the helpers here,
//! so no intermediate value survives a binarization step.

use image::{GrayImage, Luma};

/// Foreground (edge / ink) value in a binary mask.
pub const FOREGROUND: u8 = 255;

/// Background value in a binary mask.
pub const BACKGROUND: u8 = 0;

/// Midpoint cutoff used when re-binarizing blurred or blended masks.
pub const MIDPOINT: u8 = 127;

/// Binarize a grayscale image: `value > cutoff` becomes [`FOREGROUND`],
/// everything else [`BACKGROUND`].
#[must_use = "returns the binary mask"]
pub fn threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([if image.get_pixel(x, y).0[0] > cutoff {
            FOREGROUND
        } else {
            BACKGROUND
        }])
    })
}

/// Invert a binary mask (bitwise NOT).
///
/// Swaps foreground pixels (255 → 0) and background pixels (0 → 255).
#[must_use = "returns the inverted mask"]
pub fn invert(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([!mask.get_pixel(x, y).0[0]])
    })
}

/// OR `other` into `acc` in place.
///
/// Both masks must have the same dimensions; callers check this.
pub fn union_into(acc: &mut GrayImage, other: &GrayImage) {
    for (a, b) in acc.pixels_mut().zip(other.pixels()) {
        if b.0[0] != BACKGROUND {
            a.0[0] = FOREGROUND;
        }
    }
}

/// Whether every pixel is exactly [`BACKGROUND`] or [`FOREGROUND`].
#[must_use]
pub fn is_binary(image: &GrayImage) -> bool {
    image
        .pixels()
        .all(|p| p.0[0] == BACKGROUND || p.0[0] == FOREGROUND)
}

/// Count foreground pixels (value == 255).
#[must_use]
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels()
        .map(|p| u64::from(u8::from(p.0[0] == FOREGROUND)))
        .sum()
}

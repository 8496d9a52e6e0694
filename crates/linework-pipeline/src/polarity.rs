//! Final output polarity: black ink on a white page.
//!
//! The pipeline's masks mark ink as [`FOREGROUND`](crate::binary::FOREGROUND).
//! [`render_line_art`] flips that into printable black-on-white, then
//! [`normalize_polarity`] checks the corners in case the whole page came
//! out inked (for example a dark backdrop that the extractors filled in).
//!
//! The corner check assumes the corners are page background. Subjects
//! that cover three or more corners will be inverted; that is accepted.
//! A binary page with exactly two dark corners is left alone: its
//! inverse also has two dark corners (a corner mean of 127.5 either way),
//! so a rule that inverted one would flip it on every pass.

use image::GrayImage;

use crate::binary;

/// Values below this count as dark when inspecting corners.
pub const DARK_CUTOFF: u8 = 128;

/// Minimum number of dark corners (out of four) that triggers inversion.
pub const DARK_CORNER_MAJORITY: usize = 3;

/// Turn an ink mask into black-on-white line art.
#[must_use = "returns the rendered line art"]
pub fn render_line_art(mask: &GrayImage) -> GrayImage {
    binary::invert(mask)
}

/// The four corner values, clockwise from top-left. Empty images have
/// no corners.
#[must_use]
pub fn corners(image: &GrayImage) -> Option<[u8; 4]> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let (r, b) = (w - 1, h - 1);
    Some([
        image.get_pixel(0, 0).0[0],
        image.get_pixel(r, 0).0[0],
        image.get_pixel(r, b).0[0],
        image.get_pixel(0, b).0[0],
    ])
}

/// Whether most corners are dark.
#[must_use]
pub fn has_dark_background(image: &GrayImage) -> bool {
    corners(image).is_some_and(|c| {
        c.iter().filter(|&&v| v < DARK_CUTOFF).count() >= DARK_CORNER_MAJORITY
    })
}

/// Invert the image if its corners say the background is dark.
///
/// Returns the normalized image and whether it was inverted. On binary
/// input the result always has a light majority of corners, so running it
/// again changes nothing.
#[must_use = "returns the normalized image"]
pub fn normalize_polarity(image: &GrayImage) -> (GrayImage, bool) {
    if has_dark_background(image) {
        (binary::invert(image), true)
    } else {
        (image.clone(), false)
    }
}

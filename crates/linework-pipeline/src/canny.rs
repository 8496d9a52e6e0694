//! Canny edge detection on an already-smoothed grayscale grid.
//!
//! Differs from `imageproc::edges::canny` in three ways:
//!
//! 1. **No internal blur.** The multi-scale extractor controls smoothing
//!    itself (one blur per kernel size), so a fixed internal sigma would
//!    double-blur every scale.
//! 2. **Shared gradients.** Several threshold pairs run over the same
//!    blurred grid. [`Gradients`] computes Sobel responses and non-maximum
//!    suppression once; [`Gradients::hysteresis`] is then cheap per pair.
//! 3. **Bounded 8-neighbour hysteresis.** The BFS checks all eight
//!    neighbours and never steps outside the image (see
//!    <https://github.com/image-rs/imageproc/issues/705> for the upstream
//!    underflow this avoids).
//!
//! Gradient magnitude is the L1 norm `|gx| + |gy|` of the 3x3 Sobel
//! responses, which is the scale the preset threshold pairs are tuned for.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

use crate::binary::FOREGROUND;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero turns every pixel with any gradient into a
/// potential edge, which floods the mask.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Clamp a threshold pair so both are at least [`MIN_THRESHOLD`] and
/// `low <= high`.
#[must_use]
pub const fn clamp_thresholds(low: f32, high: f32) -> (f32, f32) {
    let high = high.max(MIN_THRESHOLD);
    let low = low.max(MIN_THRESHOLD).min(high);
    (low, high)
}

/// Thinned gradient magnitudes, ready for hysteresis at any threshold pair.
pub struct Gradients {
    thinned: Image<Luma<f32>>,
}

impl Gradients {
    /// Compute Sobel gradients and suppress non-maximal responses.
    #[must_use]
    pub fn new(image: &GrayImage) -> Self {
        let (gx, gy) = sobel(image);
        let magnitude = Image::from_fn(image.width(), image.height(), |x, y| {
            let h = gx.get_pixel(x, y).0[0].unsigned_abs();
            let v = gy.get_pixel(x, y).0[0].unsigned_abs();
            Luma([f32::from(h) + f32::from(v)])
        });
        let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
        Self { thinned }
    }

    /// Binary edge map for one threshold pair.
    ///
    /// Pixels at or above `high` seed edges; seeds grow through
    /// 8-connected neighbours at or above `low`. Thresholds are clamped
    /// with [`clamp_thresholds`].
    #[must_use = "returns the binary edge map"]
    pub fn hysteresis(&self, low: f32, high: f32) -> GrayImage {
        let (low, high) = clamp_thresholds(low, high);
        let (w, h) = self.thinned.dimensions();
        let strength = |x: u32, y: u32| self.thinned.get_pixel(x, y).0[0];

        let mut out = GrayImage::new(w, h);
        let mut stack = Vec::new();
        for y in 0..h {
            for x in 0..w {
                if strength(x, y) < high || out.get_pixel(x, y).0[0] == FOREGROUND {
                    continue;
                }
                out.put_pixel(x, y, Luma([FOREGROUND]));
                stack.push((x, y));
                while let Some((cx, cy)) = stack.pop() {
                    for (nx, ny) in neighbours(cx, cy, w, h) {
                        if strength(nx, ny) >= low && out.get_pixel(nx, ny).0[0] != FOREGROUND {
                            out.put_pixel(nx, ny, Luma([FOREGROUND]));
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }
        out
    }
}

/// Horizontal and vertical 3x3 Sobel responses, borders clamped.
#[must_use]
pub fn sobel(image: &GrayImage) -> (Image<Luma<i16>>, Image<Luma<i16>>) {
    let gx = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    (gx, gy)
}

/// Detect edges with a single threshold pair.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    Gradients::new(image).hysteresis(low_threshold, high_threshold)
}

/// Gradient direction quantized to the four neighbour axes.
#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Rising,
    Vertical,
    Falling,
}

fn quantize(gx: i16, gy: i16) -> Direction {
    let mut angle = f32::from(gy).atan2(f32::from(gx)).to_degrees();
    if angle < 0.0 {
        angle += 180.0;
    }
    if !(22.5..157.5).contains(&angle) {
        Direction::Horizontal
    } else if angle < 67.5 {
        Direction::Rising
    } else if angle < 112.5 {
        Direction::Vertical
    } else {
        Direction::Falling
    }
}

/// Keep only pixels that are local maxima along their gradient direction.
///
/// The one-pixel border is always suppressed.
fn non_maximum_suppression(
    magnitude: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let (w, h) = magnitude.dimensions();
    let mut out = Image::from_pixel(w, h, Luma([0.0]));
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let m = magnitude.get_pixel(x, y).0[0];
            if m <= 0.0 {
                continue;
            }
            let ((ax, ay), (bx, by)) = match quantize(gx.get_pixel(x, y).0[0], gy.get_pixel(x, y).0[0]) {
                Direction::Horizontal => ((x - 1, y), (x + 1, y)),
                Direction::Rising => ((x + 1, y + 1), (x - 1, y - 1)),
                Direction::Vertical => ((x, y - 1), (x, y + 1)),
                Direction::Falling => ((x - 1, y + 1), (x + 1, y - 1)),
            };
            if m >= magnitude.get_pixel(ax, ay).0[0] && m >= magnitude.get_pixel(bx, by).0[0] {
                out.put_pixel(x, y, Luma([m]));
            }
        }
    }
    out
}

/// In-bounds 8-neighbours of `(x, y)`.
fn neighbours(x: u32, y: u32, w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    const OFFSETS: [(i32, i32); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    OFFSETS.into_iter().filter_map(move |(dx, dy)| {
        let nx = x.checked_add_signed(dx).filter(|&nx| nx < w)?;
        let ny = y.checked_add_signed(dy).filter(|&ny| ny < h)?;
        Some((nx, ny))
    })
}

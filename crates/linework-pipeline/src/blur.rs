//! Gaussian blur helpers shared by the extractor and cleanup stages.
//!
//! Blur strength is usually specified as an odd kernel size in pixels
//! (3, 5, 7, ...), which is how the style presets describe it.
//! [`sigma_for_kernel_size`] derives the matching standard deviation and
//! [`gaussian_blur_sized`] wraps [`imageproc::filter::gaussian_blur_f32`]
//! for 8-bit grids.
//!
//! The difference-of-Gaussians extractor needs sub-integer precision, so
//! [`gaussian_blur_float`] blurs [`FloatImage`] buffers with the same
//! `imageproc` call instead of rounding back to `u8` in between.

use image::{GrayImage, ImageBuffer, Luma};

/// Single-channel floating point image.
pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Round an even kernel size up to the next odd size.
///
/// Gaussian kernels need a center pixel, so a requested size of 4 is
/// treated as 5. Odd sizes pass through unchanged.
#[must_use]
pub const fn odd_kernel_size(size: u32) -> u32 {
    if size % 2 == 0 { size + 1 } else { size }
}

/// Standard deviation for a Gaussian kernel of the given size.
///
/// Uses the conventional `0.3 * ((size - 1) / 2 - 1) + 0.8`, so sizes
/// 3, 5 and 7 map to sigmas 0.8, 1.1 and 1.4.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_kernel_size(size: u32) -> f32 {
    let size = odd_kernel_size(size) as f32;
    0.3f32.mul_add((size - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Apply Gaussian blur sized by kernel width rather than sigma.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_sized(image: &GrayImage, size: u32) -> GrayImage {
    gaussian_blur(image, sigma_for_kernel_size(size))
}

/// Convert an 8-bit grid to floating point intensities in `[0, 1]`.
#[must_use]
pub fn to_unit_float(image: &GrayImage) -> FloatImage {
    FloatImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([f32::from(image.get_pixel(x, y).0[0]) / 255.0])
    })
}

/// Apply Gaussian blur to a floating point image.
///
/// Same sigma guard as [`gaussian_blur`]; `imageproc` keeps `f32` pixels
/// unclamped, so no precision is lost between passes.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_float(image: &FloatImage, sigma: f32) -> FloatImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn even_kernel_sizes_are_rounded_up() {
        assert_eq!(odd_kernel_size(2), 3);
        assert_eq!(odd_kernel_size(4), 5);
        assert_eq!(odd_kernel_size(5), 5);
    }

    #[test]
    fn sigma_matches_conventional_values() {
        assert!((sigma_for_kernel_size(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel_size(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel_size(7) - 1.4).abs() < 1e-6);
        // 6 is auto-odded to 7.
        assert!((sigma_for_kernel_size(6) - 1.4).abs() < 1e-6);
    }

    #[test]
    fn zero_sigma_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur(&img, 0.0), img);
        assert_eq!(gaussian_blur(&img, -1.0), img);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur_sized(&sharp_edge_image(), 5);
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(left_of_edge > 0, "got {left_of_edge}");
        assert!(right_of_edge < 255, "got {right_of_edge}");
    }

    #[test]
    fn float_blur_keeps_sub_integer_precision() {
        let img = FloatImage::from_fn(12, 1, |x, _| Luma([if x < 6 { 0.0 } else { 1.0 }]));
        let blurred = gaussian_blur_float(&img, 1.0);
        let left = blurred.get_pixel(5, 0).0[0];
        let right = blurred.get_pixel(6, 0).0[0];
        assert!(left > 0.0 && left < 0.5, "got {left}");
        assert!(right > 0.5 && right < 1.0, "got {right}");
    }

    #[test]
    fn float_zero_sigma_is_identity() {
        let img = FloatImage::from_fn(4, 3, |x, y| Luma([if (x + y) % 2 == 0 { 0.25 } else { 0.75 }]));
        assert_eq!(gaussian_blur_float(&img, 0.0), img);
    }

    #[test]
    fn float_blur_keeps_uniform_image_uniform() {
        let img = FloatImage::from_pixel(9, 7, Luma([0.4]));
        let blurred = gaussian_blur_float(&img, 1.6);
        let first = blurred.get_pixel(0, 0).0[0];
        assert!((first - 0.4).abs() < 1e-5);
        assert!(blurred.pixels().all(|p| (p.0[0] - first).abs() < f32::EPSILON));
    }

    #[test]
    fn float_blur_preserves_dimensions() {
        let img = FloatImage::new(17, 31);
        let blurred = gaussian_blur_float(&img, 0.5);
        assert_eq!(blurred.dimensions(), (17, 31));
    }

    #[test]
    fn unit_float_scales_to_one() {
        let img = GrayImage::from_fn(2, 1, |x, _| image::Luma([if x == 0 { 0 } else { 255 }]));
        let float = to_unit_float(&img);
        assert!(float.get_pixel(0, 0).0[0].abs() < f32::EPSILON);
        assert!((float.get_pixel(1, 0).0[0] - 1.0).abs() < f32::EPSILON);
    }
}

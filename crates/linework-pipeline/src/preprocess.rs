//! Decoding and preprocessing: raw bytes to a denoised, contrast-normalized
//! gray grid.
//!
//! The extractors downstream are threshold-based, so noise left in flat
//! regions turns into disconnected edge fragments. Preprocessing runs
//! grayscale, optional non-local means, bilateral smoothing and CLAHE in
//! that order.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::bilateral::GaussianEuclideanColorDistance;
use serde::{Deserialize, Serialize};

use crate::blur::odd_kernel_size;
use crate::types::PipelineError;

/// Decode raw image bytes (PNG, JPEG, BMP, WebP).
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::Decode`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Luminance-weighted reduction to a single channel.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Parameters for the edge-preserving bilateral filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilateralParams {
    /// Side of the square neighbourhood in pixels. Even values behave like
    /// the next odd one down.
    pub diameter: u32,
    /// Range sigma: how different an intensity may be and still count.
    pub sigma_color: f32,
    /// Spatial sigma in pixels.
    pub sigma_space: f32,
}

impl BilateralParams {
    /// Default neighbourhood diameter.
    pub const DEFAULT_DIAMETER: u32 = 9;
    /// Largest diameter the filter window supports.
    pub const MAX_DIAMETER: u32 = 511;
    /// Default range sigma.
    pub const DEFAULT_SIGMA_COLOR: f32 = 75.0;
    /// Default spatial sigma.
    pub const DEFAULT_SIGMA_SPACE: f32 = 75.0;

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for a diameter outside
    /// `1..=MAX_DIAMETER` or a non-positive or non-finite sigma.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(1..=Self::MAX_DIAMETER).contains(&self.diameter) {
            return Err(PipelineError::InvalidParameter(format!(
                "bilateral: diameter must be in 1..={}, got {}",
                Self::MAX_DIAMETER,
                self.diameter,
            )));
        }
        for (name, sigma) in [
            ("sigma_color", self.sigma_color),
            ("sigma_space", self.sigma_space),
        ] {
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(PipelineError::InvalidParameter(format!(
                    "bilateral: {name} must be positive and finite, got {sigma}",
                )));
            }
        }
        Ok(())
    }
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            diameter: Self::DEFAULT_DIAMETER,
            sigma_color: Self::DEFAULT_SIGMA_COLOR,
            sigma_space: Self::DEFAULT_SIGMA_SPACE,
        }
    }
}

/// Parameters for contrast-limited adaptive histogram equalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaheParams {
    /// Histogram clip limit relative to a flat histogram. Zero disables
    /// clipping.
    pub clip_limit: f32,
    /// Number of tiles along each axis. The grid shrinks to the image's
    /// shorter side when the image is smaller than the grid.
    pub tile_grid: u32,
}

impl ClaheParams {
    /// Default clip limit.
    pub const DEFAULT_CLIP_LIMIT: f32 = 2.0;
    /// Default tiles per axis.
    pub const DEFAULT_TILE_GRID: u32 = 8;
    /// Largest accepted tiles per axis.
    pub const MAX_TILE_GRID: u32 = 64;

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for a tile grid outside
    /// `1..=MAX_TILE_GRID` or a negative or non-finite clip limit.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(1..=Self::MAX_TILE_GRID).contains(&self.tile_grid) {
            return Err(PipelineError::InvalidParameter(format!(
                "clahe: tile_grid must be in 1..={}, got {}",
                Self::MAX_TILE_GRID,
                self.tile_grid,
            )));
        }
        if !(self.clip_limit.is_finite() && self.clip_limit >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "clahe: clip_limit must be non-negative and finite, got {}",
                self.clip_limit,
            )));
        }
        Ok(())
    }
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: Self::DEFAULT_CLIP_LIMIT,
            tile_grid: Self::DEFAULT_TILE_GRID,
        }
    }
}

/// Parameters for non-local means denoising.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NlMeansParams {
    /// Filter strength. Larger values remove more noise and more detail.
    pub h: f32,
    /// Side of the square patch compared between pixels (odd).
    pub template_window: u32,
    /// Side of the square area searched for similar patches (odd).
    pub search_window: u32,
}

impl NlMeansParams {
    /// Default filter strength.
    pub const DEFAULT_H: f32 = 10.0;
    /// Default patch size.
    pub const DEFAULT_TEMPLATE_WINDOW: u32 = 7;
    /// Default search area size.
    pub const DEFAULT_SEARCH_WINDOW: u32 = 21;

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for a non-positive
    /// strength or a zero window.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.h.is_finite() && self.h > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "nl_means: h must be positive and finite, got {}",
                self.h,
            )));
        }
        if self.template_window == 0 || self.search_window == 0 {
            return Err(PipelineError::InvalidParameter(
                "nl_means: window sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NlMeansParams {
    fn default() -> Self {
        Self {
            h: Self::DEFAULT_H,
            template_window: Self::DEFAULT_TEMPLATE_WINDOW,
            search_window: Self::DEFAULT_SEARCH_WINDOW,
        }
    }
}

/// Full preprocessing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PreprocessParams {
    /// Optional non-local means pass before the bilateral filter.
    pub denoise: Option<NlMeansParams>,
    /// Edge-preserving smoothing.
    pub bilateral: BilateralParams,
    /// Local contrast normalization.
    pub clahe: ClaheParams,
}

impl PreprocessParams {
    /// Check every sub-stage.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError::InvalidParameter`] found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(ref nl) = self.denoise {
            nl.validate()?;
        }
        self.bilateral.validate()?;
        self.clahe.validate()
    }
}

/// Run grayscale, optional non-local means, bilateral and CLAHE.
#[must_use = "returns the preprocessed image"]
pub fn preprocess(image: &DynamicImage, params: &PreprocessParams) -> GrayImage {
    let mut gray = to_grayscale(image);
    if let Some(ref nl) = params.denoise {
        gray = non_local_means(&gray, nl);
    }
    let smoothed = bilateral_filter(&gray, &params.bilateral);
    clahe(&smoothed, &params.clahe)
}

/// Bilateral filter over a square window with replicated borders.
///
/// Wraps [`imageproc::filter::bilateral_filter`]. Each neighbour is
/// weighted by a spatial Gaussian on its distance and a range Gaussian on
/// its intensity difference from the center, so flat regions are smoothed
/// while strong boundaries survive.
#[must_use = "returns the filtered image"]
pub fn bilateral_filter(image: &GrayImage, params: &BilateralParams) -> GrayImage {
    if params.diameter <= 1 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let radius = u8::try_from(params.diameter / 2).unwrap_or(u8::MAX);
    imageproc::filter::bilateral_filter(
        image,
        radius,
        params.sigma_space,
        GaussianEuclideanColorDistance::new(params.sigma_color),
    )
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tile_grid` x `tile_grid` grid. Each tile's
/// histogram is clipped at `clip_limit` times the flat level, the excess
/// spread over all bins, and the cumulative histogram used as a lookup
/// table. Pixels blend the tables of the four nearest tile centers.
///
/// Tiles that would run past the image edge are filled by mirroring, so
/// every tile holds the same pixel count and a uniform image stays
/// uniform.
#[must_use = "returns the equalized image"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn clahe(image: &GrayImage, params: &ClaheParams) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let tiles = params.tile_grid.clamp(1, ClaheParams::MAX_TILE_GRID).min(w).min(h);
    let tile_w = w.div_ceil(tiles);
    let tile_h = h.div_ceil(tiles);
    let area = tile_w * tile_h;
    let clip = (params.clip_limit > 0.0)
        .then(|| ((params.clip_limit * area as f32 / 256.0) as u32).max(1));

    let mut luts = Vec::with_capacity((tiles * tiles) as usize);
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0u32; 256];
            for py in ty * tile_h..(ty + 1) * tile_h {
                for px in tx * tile_w..(tx + 1) * tile_w {
                    let v = image.get_pixel(reflect(px, w), reflect(py, h)).0[0];
                    hist[usize::from(v)] += 1;
                }
            }
            if let Some(limit) = clip {
                clip_histogram(&mut hist, limit);
            }
            luts.push(equalization_lut(&hist, area));
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let v = usize::from(image.get_pixel(x, y).0[0]);
        let (x1, x2, xa) = tile_neighbours(x, tile_w, tiles);
        let (y1, y2, ya) = tile_neighbours(y, tile_h, tiles);
        let lut = |tx: u32, ty: u32| f32::from(luts[(ty * tiles + tx) as usize][v]);
        let top = lut(x1, y1).mul_add(1.0 - xa, lut(x2, y1) * xa);
        let bottom = lut(x1, y2).mul_add(1.0 - xa, lut(x2, y2) * xa);
        Luma([top.mul_add(1.0 - ya, bottom * ya).round().clamp(0.0, 255.0) as u8])
    })
}

/// Mirror an index into `0..len` without repeating the edge pixel.
const fn reflect(i: u32, len: u32) -> u32 {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let m = i % period;
    if m < len { m } else { period - m }
}

/// Clip bins at `limit` and spread the excess evenly.
fn clip_histogram(hist: &mut [u32; 256], limit: u32) {
    let mut excess = 0;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let per_bin = excess / 256;
    let residual = (excess % 256) as usize;
    for bin in hist.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn equalization_lut(hist: &[u32; 256], area: u32) -> [u8; 256] {
    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// The two tile indices whose centers bracket `coord`, and the blend
/// weight of the second.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn tile_neighbours(coord: u32, tile: u32, tiles: u32) -> (u32, u32, f32) {
    let pos = coord as f32 / tile as f32 - 0.5;
    let lower = pos.floor();
    let frac = pos - lower;
    let index = lower as i64;
    let clamp = |t: i64| t.clamp(0, i64::from(tiles) - 1) as u32;
    (clamp(index), clamp(index + 1), frac)
}

/// Non-local means denoising.
///
/// Every pixel becomes a weighted average of the pixels in its search
/// window, weighted by `exp(-d / h^2)` where `d` is the mean squared
/// difference between the two surrounding patches. Patch distances for
/// one search offset at a time come from an integral image, so the cost
/// does not grow with the patch size.
#[must_use = "returns the denoised image"]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
pub fn non_local_means(image: &GrayImage, params: &NlMeansParams) -> GrayImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let template_radius = odd_kernel_size(params.template_window) / 2;
    let search_radius = (odd_kernel_size(params.search_window) / 2) as i32;
    let inv_h2 = 1.0 / (params.h * params.h);

    let stride = (w + 1) as usize;
    let idx = |x: u32, y: u32| y as usize * w as usize + x as usize;
    let mut weight_sum = vec![0.0f32; (w * h) as usize];
    let mut value_sum = vec![0.0f32; (w * h) as usize];
    let mut integral = vec![0.0f64; stride * (h + 1) as usize];

    for dy in -search_radius..=search_radius {
        for dx in -search_radius..=search_radius {
            let shifted = |x: u32, y: u32| {
                image.get_pixel(clamp_coord(x, dx, w), clamp_coord(y, dy, h)).0[0]
            };

            for y in 0..h {
                let mut row = 0.0f64;
                for x in 0..w {
                    let d = f64::from(image.get_pixel(x, y).0[0]) - f64::from(shifted(x, y));
                    row += d * d;
                    let above = integral[y as usize * stride + x as usize + 1];
                    integral[(y as usize + 1) * stride + x as usize + 1] = above + row;
                }
            }

            for y in 0..h {
                let y0 = y.saturating_sub(template_radius) as usize;
                let y1 = (y + template_radius + 1).min(h) as usize;
                for x in 0..w {
                    let x0 = x.saturating_sub(template_radius) as usize;
                    let x1 = (x + template_radius + 1).min(w) as usize;
                    let ssd = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                        - integral[y1 * stride + x0]
                        + integral[y0 * stride + x0];
                    let count = ((x1 - x0) * (y1 - y0)) as f64;
                    let weight = (-(ssd / count) as f32 * inv_h2).exp();
                    let i = idx(x, y);
                    weight_sum[i] += weight;
                    value_sum[i] += weight * f32::from(shifted(x, y));
                }
            }
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let i = idx(x, y);
        Luma([(value_sum[i] / weight_sum[i]).round().clamp(0.0, 255.0) as u8])
    })
}

/// Offset a coordinate, replicating the edge pixel when it falls outside
/// `0..len`.
fn clamp_coord(coord: u32, offset: i32, len: u32) -> u32 {
    coord
        .checked_add_signed(offset)
        .map_or(0, |c| c.min(len.saturating_sub(1)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn is_uniform(image: &GrayImage) -> bool {
        let first = image.get_pixel(0, 0).0[0];
        image.pixels().all(|p| p.0[0] == first)
    }

    fn png_bytes(image: &image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_return_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn valid_png_decodes() {
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let decoded = decode(&png_bytes(&img)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn grayscale_keeps_neutral_values() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(3, 1, |x, _| {
            let v = [0, 100, 255][x as usize];
            image::Rgb([v, v, v])
        }));
        assert_eq!(to_grayscale(&img).as_raw(), &vec![0, 100, 255]);
    }

    #[test]
    fn bilateral_keeps_uniform_image() {
        let img = GrayImage::from_pixel(12, 9, Luma([77]));
        let out = bilateral_filter(&img, &BilateralParams::default());
        assert!(is_uniform(&out));
        assert!(out.get_pixel(0, 0).0[0].abs_diff(77) <= 1);
    }

    #[test]
    fn bilateral_matches_imageproc_window() {
        let img = GrayImage::from_fn(16, 12, |x, y| Luma([if (x / 3 + y / 4) % 2 == 0 { 40 } else { 200 }]));
        let params = BilateralParams {
            diameter: 5,
            sigma_color: 30.0,
            sigma_space: 2.0,
        };
        let expected = imageproc::filter::bilateral_filter(
            &img,
            2,
            2.0,
            GaussianEuclideanColorDistance::new(30.0),
        );
        assert_eq!(bilateral_filter(&img, &params), expected);
    }

    #[test]
    fn bilateral_validate_bounds_diameter() {
        let too_wide = BilateralParams {
            diameter: BilateralParams::MAX_DIAMETER + 1,
            ..BilateralParams::default()
        };
        assert!(too_wide.validate().is_err());
        let zero = BilateralParams {
            diameter: 0,
            ..BilateralParams::default()
        };
        assert!(zero.validate().is_err());
        assert!(BilateralParams::default().validate().is_ok());
    }

    #[test]
    fn bilateral_preserves_strong_edge() {
        let img = GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let out = bilateral_filter(&img, &BilateralParams::default());
        assert!(out.get_pixel(9, 10).0[0] < 5, "got {}", out.get_pixel(9, 10).0[0]);
        assert!(out.get_pixel(10, 10).0[0] > 250, "got {}", out.get_pixel(10, 10).0[0]);
    }

    #[test]
    fn bilateral_smooths_low_amplitude_noise() {
        let img = GrayImage::from_fn(20, 20, |x, y| Luma([if (x + y) % 2 == 0 { 100 } else { 104 }]));
        let out = bilateral_filter(&img, &BilateralParams::default());
        let min = out.pixels().map(|p| p.0[0]).min().unwrap();
        let max = out.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(max - min < 4, "range {min}..={max}");
    }

    #[test]
    fn diameter_one_is_identity() {
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([((x * 37 + y * 11) % 256) as u8]));
        let params = BilateralParams {
            diameter: 1,
            ..BilateralParams::default()
        };
        assert_eq!(bilateral_filter(&img, &params), img);
    }

    #[test]
    fn clahe_keeps_uniform_image_uniform() {
        // Deliberately not a multiple of the tile grid.
        for (w, h) in [(64, 64), (67, 45), (5, 3)] {
            let img = GrayImage::from_pixel(w, h, Luma([128]));
            let out = clahe(&img, &ClaheParams::default());
            assert_eq!(out.dimensions(), (w, h));
            assert!(is_uniform(&out), "{w}x{h} not uniform");
        }
    }

    #[test]
    fn clahe_without_clip_equalizes_single_tile() {
        // 32 equally common values from 100 to 131.
        let img = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x / 2) as u8]));
        let params = ClaheParams {
            clip_limit: 0.0,
            tile_grid: 1,
        };
        let out = clahe(&img, &params);
        let min = out.pixels().map(|p| p.0[0]).min().unwrap();
        let max = out.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(min <= 10, "min {min}");
        assert_eq!(max, 255);
    }

    #[test]
    fn clahe_validate_bounds_tile_grid() {
        let huge = ClaheParams {
            tile_grid: u32::MAX,
            ..ClaheParams::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
        let max = ClaheParams {
            tile_grid: ClaheParams::MAX_TILE_GRID,
            ..ClaheParams::default()
        };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn clahe_grid_shrinks_to_image() {
        let img = GrayImage::from_fn(1, 5, |_, y| Luma([u8::try_from(30 * y).unwrap()]));
        let single = ClaheParams {
            clip_limit: 0.0,
            tile_grid: 1,
        };
        let oversized = ClaheParams {
            tile_grid: ClaheParams::MAX_TILE_GRID,
            ..single
        };
        let out = clahe(&img, &oversized);
        assert_eq!(out, clahe(&img, &single));
        assert_eq!(out.get_pixel(0, 4).0[0], 255);
    }

    #[test]
    fn reflect_mirrors_without_repeating_edge() {
        assert_eq!(reflect(0, 4), 0);
        assert_eq!(reflect(3, 4), 3);
        assert_eq!(reflect(4, 4), 2);
        assert_eq!(reflect(6, 4), 0);
        assert_eq!(reflect(7, 4), 1);
        assert_eq!(reflect(9, 1), 0);
    }

    #[test]
    fn clip_histogram_conserves_count() {
        let mut hist = [0u32; 256];
        hist[10] = 1000;
        hist[20] = 3;
        clip_histogram(&mut hist, 8);
        assert_eq!(hist.iter().sum::<u32>(), 1003);
        assert!(hist[10] <= 8 + 4);
    }

    #[test]
    fn nl_means_keeps_uniform_image() {
        let img = GrayImage::from_pixel(15, 11, Luma([60]));
        let out = non_local_means(&img, &NlMeansParams::default());
        assert!(out.pixels().all(|p| p.0[0] == 60));
    }

    #[test]
    fn nl_means_suppresses_isolated_spike() {
        let mut img = GrayImage::from_pixel(15, 15, Luma([100]));
        img.put_pixel(7, 7, Luma([130]));
        let out = non_local_means(&img, &NlMeansParams::default());
        assert!(out.get_pixel(7, 7).0[0] < 110, "got {}", out.get_pixel(7, 7).0[0]);
    }

    #[test]
    fn preprocess_keeps_uniform_input_uniform() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(40, 30, image::Rgb([90, 90, 90])));
        let plain = preprocess(&img, &PreprocessParams::default());
        assert_eq!(plain.dimensions(), (40, 30));
        assert!(is_uniform(&plain));

        let denoised = PreprocessParams {
            denoise: Some(NlMeansParams::default()),
            ..PreprocessParams::default()
        };
        assert!(is_uniform(&preprocess(&img, &denoised)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_diameter = BilateralParams {
            diameter: 0,
            ..BilateralParams::default()
        };
        assert!(matches!(
            zero_diameter.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));

        let negative_clip = ClaheParams {
            clip_limit: -1.0,
            ..ClaheParams::default()
        };
        assert!(negative_clip.validate().is_err());

        let zero_grid = ClaheParams {
            tile_grid: 0,
            ..ClaheParams::default()
        };
        assert!(zero_grid.validate().is_err());

        let params = PreprocessParams {
            denoise: Some(NlMeansParams {
                h: 0.0,
                ..NlMeansParams::default()
            }),
            ..PreprocessParams::default()
        };
        assert!(params.validate().is_err());
        assert!(PreprocessParams::default().validate().is_ok());
    }
}

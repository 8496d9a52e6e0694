//! linework-pipeline: Pure raster-to-line-art pipeline (sans-IO).
//!
//! Converts a photo or drawing into black-on-white line art suitable for
//! a coloring page:
//! preprocess -> edge extractors -> combine -> cleanup ->
//! speckle filter -> render -> polarity normalization.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and `image` buffers. Reading and writing files lives in
//! `linework-bench`.

pub mod binary;
pub mod blur;
pub mod canny;
pub mod cleanup;
pub mod combine;
pub mod components;
pub mod diagnostics;
pub mod edge;
pub mod morphology;
pub mod polarity;
pub mod postprocess;
pub mod preprocess;
pub mod style;
pub mod types;

use image::DynamicImage;

pub use combine::{Combiner, Source};
pub use edge::{EdgeExtractor, Extractor};
pub use postprocess::PureBwParams;
pub use style::{Resolved, Style};
pub use types::{
    Dimensions, GrayImage, LineArtConfig, PipelineError, ProcessResult, RgbaImage, StagedResult,
};

/// Convert a decoded image into black-on-white line art.
///
/// # Pipeline steps
///
/// 1. Grayscale, optional non-local means, bilateral smoothing, CLAHE
/// 2. Every configured edge extractor, with optional per-source inversion
/// 3. Combine the source masks (OR or weighted)
/// 4. Opening, closing, thickness adjustment, smoothing
/// 5. Remove small connected components
/// 6. Render ink as black on white
/// 7. Invert if the corners say the page came out dark
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `config` fails
/// validation; nothing is processed in that case.
/// Returns [`PipelineError::EmptyInput`] if the image has a zero dimension.
pub fn convert(image: &DynamicImage, config: &LineArtConfig) -> Result<GrayImage, PipelineError> {
    config.validate()?;
    let dimensions = checked_dimensions(image)?;
    let (staged, _) =
        diagnostics::run_stages(image, dimensions, config, &diagnostics::NullClock)?;
    Ok(staged.output)
}

/// Decode image bytes and convert them to line art.
///
/// The configuration is validated before the bytes are decoded.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for an invalid
/// configuration, [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// and [`PipelineError::Decode`] if the image format is unrecognized.
pub fn process(image_bytes: &[u8], config: &LineArtConfig) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let decoded = preprocess::decode(image_bytes)?;
    let dimensions = checked_dimensions(&decoded)?;
    let image = convert(&decoded, config)?;
    Ok(ProcessResult { image, dimensions })
}

/// Decode and convert, keeping every intermediate raster.
///
/// Produces the same final image as [`process`].
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &LineArtConfig,
) -> Result<StagedResult, PipelineError> {
    diagnostics::process_staged_with_diagnostics(image_bytes, config, &diagnostics::NullClock)
        .map(|(staged, _)| staged)
}

/// Decode a drawing and force it to pure black on white.
///
/// Unlike [`process`], no edges are extracted; see
/// [`postprocess::pure_black_and_white`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for invalid `params`,
/// [`PipelineError::EmptyInput`] for empty bytes or a zero-sized image,
/// and [`PipelineError::Decode`] if the image format is unrecognized.
pub fn process_pure_bw(
    image_bytes: &[u8],
    params: &PureBwParams,
) -> Result<ProcessResult, PipelineError> {
    params.validate()?;
    let decoded = preprocess::decode(image_bytes)?;
    let dimensions = checked_dimensions(&decoded)?;
    let image = postprocess::pure_black_and_white(&decoded, params);
    Ok(ProcessResult { image, dimensions })
}

/// Encode a gray grid as PNG bytes.
///
/// # Errors
///
/// Returns [`PipelineError::Encode`] if the encoder rejects the image.
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )
    .map_err(PipelineError::Encode)?;
    Ok(buf)
}

/// Dimensions of a decoded image, rejecting zero-sized ones.
pub(crate) fn checked_dimensions(image: &DynamicImage) -> Result<Dimensions, PipelineError> {
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    if dimensions.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(dimensions)
}

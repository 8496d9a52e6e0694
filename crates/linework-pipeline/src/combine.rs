//! Merge several extractor masks into one.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::binary::{self, BACKGROUND, FOREGROUND, MIDPOINT};
use crate::edge::{EdgeExtractor, Extractor};
use crate::types::PipelineError;

/// One combiner input: an extractor, optionally inverted before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// The extractor producing this input.
    pub extractor: Extractor,
    /// Invert the extractor's mask before combining.
    #[serde(default)]
    pub invert: bool,
}

impl Source {
    /// A non-inverted source.
    #[must_use]
    pub const fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            invert: false,
        }
    }

    /// A source whose mask is inverted before combining.
    #[must_use]
    pub const fn inverted(extractor: Extractor) -> Self {
        Self {
            extractor,
            invert: true,
        }
    }

    /// Run the extractor and apply the optional inversion.
    #[must_use = "returns the source mask"]
    pub fn extract(&self, image: &GrayImage) -> GrayImage {
        let mask = self.extractor.extract(image);
        if self.invert {
            binary::invert(&mask)
        } else {
            mask
        }
    }
}

/// How source masks are merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Combiner {
    /// Foreground wherever any input is foreground.
    #[default]
    Or,
    /// Per-pixel weighted sum, rounded and saturated to 0-255, then
    /// re-binarized above the midpoint.
    Weighted {
        /// One weight per input, in input order.
        weights: Vec<f32>,
    },
}

impl Combiner {
    /// Check the combiner against the number of inputs it will receive.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] when there are no
    /// inputs, the weight count differs from `inputs`, or a weight is not
    /// finite.
    pub fn validate(&self, inputs: usize) -> Result<(), PipelineError> {
        if inputs == 0 {
            return Err(PipelineError::InvalidParameter(
                "combiner needs at least one input".to_string(),
            ));
        }
        if let Self::Weighted { weights } = self {
            if weights.len() != inputs {
                return Err(PipelineError::InvalidParameter(format!(
                    "combiner has {} weights for {inputs} inputs",
                    weights.len(),
                )));
            }
            if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
                return Err(PipelineError::InvalidParameter(format!(
                    "combiner weight must be finite, got {w}",
                )));
            }
        }
        Ok(())
    }

    /// Merge `masks` into a single binary mask.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for an invalid combiner
    /// (see [`validate`](Self::validate)) or masks of differing shapes.
    pub fn combine(&self, masks: &[GrayImage]) -> Result<GrayImage, PipelineError> {
        self.validate(masks.len())?;
        let Some((first, rest)) = masks.split_first() else {
            return Err(PipelineError::InvalidParameter(
                "combiner needs at least one input".to_string(),
            ));
        };
        if let Some(m) = rest.iter().find(|m| m.dimensions() != first.dimensions()) {
            return Err(PipelineError::InvalidParameter(format!(
                "combiner inputs differ in shape: {:?} vs {:?}",
                first.dimensions(),
                m.dimensions(),
            )));
        }

        Ok(match self {
            Self::Or => {
                let mut out = first.clone();
                for m in rest {
                    binary::union_into(&mut out, m);
                }
                out
            }
            Self::Weighted { weights } => weighted(masks, weights),
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn weighted(masks: &[GrayImage], weights: &[f32]) -> GrayImage {
    let (w, h) = masks.first().map_or((0, 0), GrayImage::dimensions);
    GrayImage::from_fn(w, h, |x, y| {
        let sum: f32 = masks
            .iter()
            .zip(weights)
            .map(|(m, &weight)| f32::from(m.get_pixel(x, y).0[0]) * weight)
            .sum();
        let blended = sum.round().clamp(0.0, 255.0) as u8;
        Luma([if blended > MIDPOINT {
            FOREGROUND
        } else {
            BACKGROUND
        }])
    })
}

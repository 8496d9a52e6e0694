//! Connected-component speckle filter.
//!
//! Morphological opening removes specks smaller than its element. Blobs
//! that survive it but are still too small to matter (JPEG ringing, stray
//! marks) are removed here by pixel area.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::{Deserialize, Serialize};

use crate::binary::{BACKGROUND, FOREGROUND};
use crate::types::PipelineError;

/// One 8-connected foreground component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Label assigned by the labelling pass, starting at 1.
    pub label: u32,
    /// Number of pixels in the component.
    pub area: u64,
}

/// Parameters for the speckle filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentFilterParams {
    /// Components with fewer pixels than this are cleared. `1` keeps
    /// every component.
    pub min_area: u64,
}

impl ComponentFilterParams {
    /// Default minimum component area in pixels.
    pub const DEFAULT_MIN_AREA: u64 = 30;

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for a zero `min_area`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_area == 0 {
            return Err(PipelineError::InvalidParameter(
                "components: min_area must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ComponentFilterParams {
    fn default() -> Self {
        Self {
            min_area: Self::DEFAULT_MIN_AREA,
        }
    }
}

/// Label foreground components and return their areas, ordered by label.
#[must_use]
pub fn component_areas(mask: &GrayImage) -> Vec<Component> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));
    areas_by_label(&labels)
        .into_iter()
        .enumerate()
        .skip(1)
        .filter(|&(_, area)| area > 0)
        .filter_map(|(label, area)| {
            Some(Component {
                label: u32::try_from(label).ok()?,
                area,
            })
        })
        .collect()
}

/// Clear every 8-connected foreground component with fewer than
/// `min_area` pixels. Background pixels are never changed.
#[must_use = "returns the filtered mask"]
pub fn remove_small_components(mask: &GrayImage, min_area: u64) -> GrayImage {
    if min_area <= 1 {
        return mask.clone();
    }
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));
    let areas = areas_by_label(&labels);
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let label = labels.get_pixel(x, y).0[0] as usize;
        let keep = label != 0 && areas.get(label).is_some_and(|&area| area >= min_area);
        Luma([if keep { FOREGROUND } else { BACKGROUND }])
    })
}

/// Pixel count per label; index 0 is the background.
fn areas_by_label(labels: &imageproc::definitions::Image<Luma<u32>>) -> Vec<u64> {
    let max_label = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0) as usize;
    let mut areas = vec![0u64; max_label + 1];
    for p in labels.pixels() {
        areas[p.0[0] as usize] += 1;
    }
    areas
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::binary;

    fn mask_with(w: u32, h: u32, points: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for &(x, y) in points {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        mask
    }

    /// A 5-pixel diagonal stroke, a 2-pixel blob and a single speck.
    fn three_components() -> GrayImage {
        mask_with(
            20,
            20,
            &[
                (1, 1),
                (2, 2),
                (3, 3),
                (4, 4),
                (5, 5),
                (10, 10),
                (11, 10),
                (17, 3),
            ],
        )
    }

    #[test]
    fn diagonal_pixels_form_one_component() {
        let mut areas: Vec<u64> = component_areas(&three_components())
            .iter()
            .map(|c| c.area)
            .collect();
        areas.sort_unstable();
        assert_eq!(areas, vec![1, 2, 5]);
    }

    #[test]
    fn labels_start_at_one() {
        let components = component_areas(&three_components());
        assert!(components.iter().all(|c| c.label >= 1));
    }

    #[test]
    fn single_speckle_is_removed() {
        let mask = mask_with(50, 50, &[(25, 25)]);
        let filtered = remove_small_components(&mask, 10);
        assert_eq!(binary::count_foreground(&filtered), 0);
    }

    #[test]
    fn components_at_the_floor_are_kept() {
        let filtered = remove_small_components(&three_components(), 2);
        assert_eq!(binary::count_foreground(&filtered), 7);
        assert_eq!(filtered.get_pixel(17, 3).0[0], BACKGROUND);
        assert_eq!(filtered.get_pixel(11, 10).0[0], FOREGROUND);
    }

    /// Labels of the input's components that still have pixels in
    /// `filtered`, asserting each survivor is kept whole.
    fn surviving_labels(mask: &GrayImage, filtered: &GrayImage) -> BTreeSet<u32> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));
        let mut kept = BTreeSet::new();
        let mut dropped = BTreeSet::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0];
            if label == 0 {
                continue;
            }
            if filtered.get_pixel(x, y).0[0] == FOREGROUND {
                kept.insert(label);
            } else {
                dropped.insert(label);
            }
        }
        assert!(kept.is_disjoint(&dropped), "a component was split");
        kept
    }

    #[test]
    fn surviving_components_shrink_as_min_area_grows() {
        let mask = three_components();
        let mut previous = surviving_labels(&mask, &mask);
        assert_eq!(previous.len(), 3);
        for min_area in 1..8 {
            let kept = surviving_labels(&mask, &remove_small_components(&mask, min_area));
            assert!(
                kept.is_subset(&previous),
                "min_area {min_area} revived a component"
            );
            previous = kept;
        }
        assert!(previous.is_empty());
    }

    #[test]
    fn validate_rejects_zero_min_area() {
        let zero = ComponentFilterParams { min_area: 0 };
        assert!(matches!(
            zero.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
        assert!(ComponentFilterParams { min_area: 1 }.validate().is_ok());
        assert!(ComponentFilterParams::default().validate().is_ok());
    }

    #[test]
    fn empty_mask_has_no_components() {
        let mask = GrayImage::new(10, 10);
        assert!(component_areas(&mask).is_empty());
        assert_eq!(remove_small_components(&mask, 30), mask);
    }

    #[test]
    fn filtered_mask_is_subset_of_input() {
        let mask = three_components();
        let filtered = remove_small_components(&mask, 3);
        for (f, m) in filtered.pixels().zip(mask.pixels()) {
            assert!(f.0[0] <= m.0[0]);
        }
    }
}

//! Binary morphology with square structuring elements.
//!
//! Thin wrappers over [`imageproc::morphology`]. An element of side `size`
//! is anchored at `size / 2`, so it covers offsets
//! `-(size / 2)..=size - 1 - size / 2` on each axis (a 2x2 element covers
//! `-1..=0`). Neighbours outside the image are ignored: erosion never eats
//! in from the border and dilation never grows out of it.
//!
//! Opening and closing apply the second step with the reflected element,
//! which keeps even-sized elements from shifting the mask. Odd sizes are
//! symmetric and go straight to `grayscale_open` / `grayscale_close`.

use image::{GrayImage, Luma};
use imageproc::morphology::{
    Mask, grayscale_close, grayscale_dilate, grayscale_erode, grayscale_open,
};

use crate::binary::FOREGROUND;

/// Largest supported element side.
pub const MAX_ELEMENT_SIZE: u32 = 255;

/// Square element of side `size` anchored at `anchor` on both axes.
fn square_element(size: u32, anchor: u32) -> Mask {
    let size = size.clamp(1, MAX_ELEMENT_SIZE);
    let anchor = u8::try_from(anchor.min(size - 1)).unwrap_or(u8::MAX);
    Mask::from_image(&GrayImage::from_pixel(size, size, Luma([FOREGROUND])), anchor, anchor)
}

/// The element and its reflection through the origin.
fn element_pair(size: u32) -> (Mask, Mask) {
    let size = size.clamp(1, MAX_ELEMENT_SIZE);
    (
        square_element(size, size / 2),
        square_element(size, size - 1 - size / 2),
    )
}

fn is_identity(mask: &GrayImage, size: u32) -> bool {
    size <= 1 || mask.width() == 0 || mask.height() == 0
}

/// Erode with a `size` x `size` element. Sizes below 2 are the identity.
#[must_use = "returns the eroded mask"]
pub fn erode(mask: &GrayImage, size: u32) -> GrayImage {
    if is_identity(mask, size) {
        return mask.clone();
    }
    grayscale_erode(mask, &element_pair(size).0)
}

/// Dilate with a `size` x `size` element. Sizes below 2 are the identity.
#[must_use = "returns the dilated mask"]
pub fn dilate(mask: &GrayImage, size: u32) -> GrayImage {
    if is_identity(mask, size) {
        return mask.clone();
    }
    grayscale_dilate(mask, &element_pair(size).0)
}

/// Opening: erosion followed by dilation with the reflected element.
///
/// Removes foreground features smaller than the element.
#[must_use = "returns the opened mask"]
pub fn open(mask: &GrayImage, size: u32) -> GrayImage {
    if is_identity(mask, size) {
        return mask.clone();
    }
    let (element, reflected) = element_pair(size);
    if size % 2 == 1 {
        return grayscale_open(mask, &element);
    }
    grayscale_dilate(&grayscale_erode(mask, &element), &reflected)
}

/// Closing: dilation followed by erosion with the reflected element.
///
/// Fills background gaps smaller than the element.
#[must_use = "returns the closed mask"]
pub fn close(mask: &GrayImage, size: u32) -> GrayImage {
    if is_identity(mask, size) {
        return mask.clone();
    }
    let (element, reflected) = element_pair(size);
    if size % 2 == 1 {
        return grayscale_close(mask, &element);
    }
    grayscale_erode(&grayscale_dilate(mask, &element), &reflected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{self, BACKGROUND};

    fn mask_with(w: u32, h: u32, points: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for &(x, y) in points {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        mask
    }

    fn block(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let inside = (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y);
            Luma([if inside { FOREGROUND } else { BACKGROUND }])
        })
    }

    #[test]
    fn odd_elements_match_imageproc_squares() {
        assert_eq!(element_pair(3).0, Mask::square(1));
        assert_eq!(element_pair(3).1, Mask::square(1));
        assert_eq!(element_pair(5).0, Mask::square(2));
    }

    #[test]
    fn even_element_and_reflection_differ() {
        let (element, reflected) = element_pair(2);
        assert_ne!(element, reflected);
        // A 2x2 element anchored at (1, 1) erodes toward negative offsets.
        let eroded = erode(&block(8, 8, 2, 2, 3), 2);
        assert_eq!(eroded, block(8, 8, 3, 3, 2));
    }

    #[test]
    fn size_one_is_identity() {
        let mask = mask_with(6, 6, &[(1, 1), (4, 2)]);
        assert_eq!(erode(&mask, 1), mask);
        assert_eq!(dilate(&mask, 1), mask);
        assert_eq!(open(&mask, 1), mask);
        assert_eq!(close(&mask, 1), mask);
    }

    #[test]
    fn empty_image_is_returned_unchanged() {
        let empty = GrayImage::new(0, 4);
        assert_eq!(dilate(&empty, 3), empty);
        assert_eq!(close(&empty, 2), empty);
    }

    #[test]
    fn dilate_two_grows_toward_positive_offsets() {
        let dilated = dilate(&mask_with(10, 10, &[(5, 5)]), 2);
        assert_eq!(dilated, mask_with(10, 10, &[(5, 5), (6, 5), (5, 6), (6, 6)]));
    }

    #[test]
    fn open_removes_single_pixel_speckle() {
        let opened = open(&mask_with(10, 10, &[(4, 4)]), 2);
        assert_eq!(binary::count_foreground(&opened), 0);
    }

    #[test]
    fn open_keeps_block_in_place() {
        let mask = block(12, 12, 3, 4, 2);
        assert_eq!(open(&mask, 2), mask);
        let larger = block(12, 12, 2, 2, 5);
        assert_eq!(open(&larger, 3), larger);
    }

    #[test]
    fn close_keeps_even_block_in_place() {
        let mask = block(12, 12, 4, 5, 3);
        assert_eq!(close(&mask, 2), mask);
    }

    #[test]
    fn close_bridges_one_pixel_gap() {
        let mut points: Vec<(u32, u32)> = (1..5).map(|x| (x, 5)).collect();
        points.extend((6..10).map(|x| (x, 5)));
        let closed = close(&mask_with(12, 12, &points), 3);
        assert_eq!(closed.get_pixel(5, 5).0[0], FOREGROUND);
        // The line does not thicken.
        assert_eq!(closed.get_pixel(5, 4).0[0], BACKGROUND);
        assert_eq!(closed.get_pixel(5, 6).0[0], BACKGROUND);
    }

    #[test]
    fn erosion_does_not_eat_from_border() {
        let full = GrayImage::from_pixel(5, 5, Luma([FOREGROUND]));
        assert_eq!(erode(&full, 3), full);
    }

    #[test]
    fn dilation_does_not_grow_from_border() {
        let empty = GrayImage::new(5, 5);
        assert_eq!(dilate(&empty, 3), empty);
    }

    #[test]
    fn oversized_element_is_clamped() {
        let mask = mask_with(4, 4, &[(1, 1)]);
        let dilated = dilate(&mask, MAX_ELEMENT_SIZE + 100);
        assert_eq!(binary::count_foreground(&dilated), 16);
    }

    #[test]
    fn open_is_anti_extensive_and_close_is_extensive() {
        let mask = GrayImage::from_fn(20, 20, |x, y| {
            Luma([if (x * 7 + y * 13) % 5 < 2 { FOREGROUND } else { BACKGROUND }])
        });
        for size in [2, 3] {
            let opened = open(&mask, size);
            let closed = close(&mask, size);
            for ((o, m), c) in opened.pixels().zip(mask.pixels()).zip(closed.pixels()) {
                assert!(o.0[0] <= m.0[0]);
                assert!(m.0[0] <= c.0[0]);
            }
            assert!(binary::is_binary(&opened));
            assert!(binary::is_binary(&closed));
        }
    }

    #[test]
    fn open_is_idempotent() {
        let mask = GrayImage::from_fn(20, 20, |x, y| {
            Luma([if (x * 3 + y * 5) % 7 < 4 { FOREGROUND } else { BACKGROUND }])
        });
        let once = open(&mask, 3);
        assert_eq!(open(&once, 3), once);
    }
}

//! Shared builders for synthetic scenes, assets, and detections.

use image::{Rgb, RgbImage};

use crate::pose::{Detection, Keypoint};

/// Gentle two-axis gradient: distinct content everywhere, about one
/// intensity level per pixel, so sub-pixel resampling noise stays small.
pub(crate) fn gradient_scene(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x + y).min(255) as u8, x.min(255) as u8, y.min(255) as u8])
    })
}

/// Uniform-color asset on no background (every pixel is content).
pub(crate) fn solid_asset(w: u32, h: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb(color))
}

/// Detection from a bbox and (x, y, score) keypoint triples.
pub(crate) fn detection(bbox: [f32; 4], kpts: &[(f32, f32, f32)]) -> Detection {
    Detection {
        bbox,
        bbox_score: None,
        keypoints: kpts
            .iter()
            .map(|&(x, y, s)| Keypoint::new(x, y, s))
            .collect(),
    }
}

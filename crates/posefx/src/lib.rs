//! posefx — pose-driven visual effects for still images.
//!
//! Composites decorative effects onto a scene image, anchored at body
//! keypoints produced by an upstream pose estimator. The stages are:
//!
//! 1. **Gate** – per-detection keypoint confidence filtering; a detection
//!    with any required keypoint below threshold is skipped silently.
//! 2. **Remap** – a radial pinch distortion folded into a per-pixel
//!    coordinate field, resampled with bilinear interpolation (bug-eye).
//! 3. **Homography** – 4-point DLT mapping asset anchor points into scene
//!    coordinates.
//! 4. **Overlay** – inverse-mapped asset warp into a scene-sized buffer,
//!    threshold/alpha masking, hard masked copy onto the working image.
//! 5. **Effects** – the four variants (bug-eye, sunglasses, hat,
//!    firecracker) folded sequentially over the detection list; each
//!    detection's contribution is applied to the output of the previous one.
//!
//! # Public API
//!
//! The four `apply_*_effect` functions are the primary entry points. The
//! lower-level homography, remap, and overlay building blocks are exported
//! for callers composing custom effects.
//!
//! Image decoding/encoding and pose estimation are external collaborators;
//! see the `posefx-cli` crate for a file-driven front end.

mod effects;
mod homography;
mod overlay;
mod pose;
mod remap;

#[cfg(test)]
mod test_utils;

pub use effects::{
    apply_bugeye_effect, apply_firecracker_effect, apply_hat_effect, apply_sunglasses_effect,
    EffectError, BUGEYE_EPS, BUGEYE_K1, DEFAULT_KPT_THR, FIRECRACKER_MASK, HAT_MASK,
    SUNGLASSES_MASK,
};
pub use homography::{
    estimate_homography_dlt, project, reprojection_error, HomographyError,
};
pub use overlay::{
    composite_masked, corner_anchors, overlay_patch, quadrant_anchors, warp_asset, MaskPolicy,
};
pub use pose::{coco, Detection, Keypoint};
pub use remap::RemapField;

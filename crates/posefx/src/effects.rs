//! The four effect variants: gating, anchor geometry, and the detection fold.
//!
//! Every effect is a fold over the detection list with the working image as
//! accumulator: detection N's warp reads the output of detection N−1, so
//! compounding order is an explicit, testable contract (and the reason the
//! fold must stay sequential). Each variant is a pure configuration of
//! anchor derivation + mask policy layered on the shared overlay engine;
//! only the bug-eye effect goes through the remap engine instead.

use image::{RgbImage, RgbaImage};

use crate::homography::HomographyError;
use crate::overlay::{self, corner_anchors, quadrant_anchors, MaskPolicy};
use crate::pose::{Detection, Keypoint};
use crate::remap::RemapField;

/// Radial distortion coefficient of the bug-eye warp.
pub const BUGEYE_K1: f32 = 0.001;
/// Regularizer added to r² before normalization; keeps the anchor itself a
/// fixed point of the remap.
pub const BUGEYE_EPS: f32 = 1e-5;

/// Default keypoint confidence threshold shared by all effects.
pub const DEFAULT_KPT_THR: f32 = 0.5;

/// Sunglasses mask: reject the white background above gray 200.
pub const SUNGLASSES_MASK: MaskPolicy = MaskPolicy::GrayBelow(200);
/// Firecracker mask: brighter asset art, so the white cutoff sits at 240.
pub const FIRECRACKER_MASK: MaskPolicy = MaskPolicy::GrayBelow(240);
/// Hat mask: alpha channel gated at 128, plus a gray floor of 30 to drop
/// near-white fringes that survive the alpha mask.
pub const HAT_MASK: MaskPolicy = MaskPolicy::AlphaAndGray {
    min_alpha: 128,
    min_gray: 30,
};

/// Errors surfaced by the effect orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectError {
    /// A keypoint index lies outside a detection's keypoint sequence.
    /// Indices must match the upstream detector's body-part schema.
    KeypointIndex { index: usize, len: usize },
    /// Homography estimation failed.
    Homography(HomographyError),
}

impl std::fmt::Display for EffectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeypointIndex { index, len } => {
                write!(f, "keypoint index {} out of range for {} keypoints", index, len)
            }
            Self::Homography(err) => write!(f, "homography: {}", err),
        }
    }
}

impl std::error::Error for EffectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Homography(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HomographyError> for EffectError {
    fn from(err: HomographyError) -> Self {
        Self::Homography(err)
    }
}

/// Keypoint at `index`, or a typed fault for a malformed detection.
fn kpt(det: &Detection, index: usize) -> Result<Keypoint, EffectError> {
    det.get(index).ok_or(EffectError::KeypointIndex {
        index,
        len: det.keypoints.len(),
    })
}

/// Bug-eye lens distortion anchored at both eyes.
///
/// Per eligible detection: a fresh identity remap field takes one radial
/// pinch per eye (the second pinch reads the grid already distorted by the
/// first, so the two compose), scaled by the squared bounding-box diagonal,
/// then the working image is resampled through the field. Detections
/// compound in list order.
pub fn apply_bugeye_effect(
    img: &RgbImage,
    detections: &[Detection],
    left_eye_index: usize,
    right_eye_index: usize,
    kpt_thr: f32,
) -> Result<RgbImage, EffectError> {
    detections.iter().try_fold(img.clone(), |acc, det| {
        let leye = kpt(det, left_eye_index)?;
        let reye = kpt(det, right_eye_index)?;
        if leye.score < kpt_thr || reye.score < kpt_thr {
            return Ok(acc);
        }

        let scale = det.bbox_diag_sq();
        let mut field = RemapField::identity(acc.width(), acc.height());
        for anchor in [leye.xy(), reye.xy()] {
            field.pinch(anchor, BUGEYE_K1, BUGEYE_EPS, scale);
        }
        Ok(field.remap(&acc))
    })
}

/// Sunglasses overlay spanning both eyes.
///
/// `asset` is a white-background image; its 30%/70% quadrant centers land on
/// a small rectangle built from the eye positions and the orthogonal
/// half-eye-vector.
pub fn apply_sunglasses_effect(
    img: &RgbImage,
    detections: &[Detection],
    asset: &RgbImage,
    left_eye_index: usize,
    right_eye_index: usize,
    kpt_thr: f32,
) -> Result<RgbImage, EffectError> {
    let asset = overlay::with_opaque_alpha(asset);
    let src = quadrant_anchors(asset.width(), asset.height());

    detections.iter().try_fold(img.clone(), |mut acc, det| {
        let leye = kpt(det, left_eye_index)?;
        let reye = kpt(det, right_eye_index)?;
        if leye.score < kpt_thr || reye.score < kpt_thr {
            return Ok(acc);
        }

        let dst = sunglasses_targets(leye.xy(), reye.xy());
        overlay::overlay_patch(&mut acc, &asset, &src, &dst, SUNGLASSES_MASK)?;
        Ok(acc)
    })
}

/// Hat overlay above the eye line.
///
/// `asset` must carry an alpha channel; masking combines the alpha gate with
/// a minimum-brightness check ([`HAT_MASK`]).
pub fn apply_hat_effect(
    img: &RgbImage,
    detections: &[Detection],
    asset: &RgbaImage,
    left_eye_index: usize,
    right_eye_index: usize,
    kpt_thr: f32,
) -> Result<RgbImage, EffectError> {
    let src = quadrant_anchors(asset.width(), asset.height());

    detections.iter().try_fold(img.clone(), |mut acc, det| {
        let leye = kpt(det, left_eye_index)?;
        let reye = kpt(det, right_eye_index)?;
        if leye.score < kpt_thr || reye.score < kpt_thr {
            return Ok(acc);
        }

        let dst = hat_targets(leye.xy(), reye.xy());
        overlay::overlay_patch(&mut acc, asset, &src, &dst, HAT_MASK)?;
        Ok(acc)
    })
}

/// Firecracker overlay hanging from each wrist.
///
/// The only variant with two independent invocations per detection: each
/// wrist is gated on its own, so one side can be drawn while the other is
/// skipped. The target rectangle is a third of the scene height, with width
/// from the asset aspect ratio.
pub fn apply_firecracker_effect(
    img: &RgbImage,
    detections: &[Detection],
    asset: &RgbImage,
    left_wrist_index: usize,
    right_wrist_index: usize,
    kpt_thr: f32,
) -> Result<RgbImage, EffectError> {
    let asset = overlay::with_opaque_alpha(asset);
    let src = corner_anchors(asset.width(), asset.height());
    let h_tar = img.height() as f64 / 3.0;
    let w_tar = h_tar / asset.height() as f64 * asset.width() as f64;

    detections.iter().try_fold(img.clone(), |mut acc, det| {
        for index in [left_wrist_index, right_wrist_index] {
            let wrist = kpt(det, index)?;
            if wrist.score < kpt_thr {
                continue;
            }
            let dst = wrist_rect_targets(wrist.xy(), w_tar, h_tar);
            overlay::overlay_patch(&mut acc, &asset, &src, &dst, FIRECRACKER_MASK)?;
        }
        Ok(acc)
    })
}

/// Half the eye-to-eye vector and its 90°-rotated orthogonal, the two basis
/// vectors of every eye-anchored target rectangle.
fn eye_basis(leye: [f32; 2], reye: [f32; 2]) -> ([f64; 2], [f64; 2]) {
    let vx = 0.5 * (reye[0] - leye[0]) as f64;
    let vy = 0.5 * (reye[1] - leye[1]) as f64;
    ([vx, vy], [-vy, vx])
}

/// Sunglasses targets: eyes offset by ±vo, paired with [`quadrant_anchors`].
fn sunglasses_targets(leye: [f32; 2], reye: [f32; 2]) -> [[f64; 2]; 4] {
    let (_, vo) = eye_basis(leye, reye);
    let (lx, ly) = (leye[0] as f64, leye[1] as f64);
    let (rx, ry) = (reye[0] as f64, reye[1] as f64);
    [
        [rx + vo[0], ry + vo[1]],
        [rx - vo[0], ry - vo[1]],
        [lx + vo[0], ly + vo[1]],
        [lx - vo[0], ly - vo[1]],
    ]
}

/// Hat targets: extend 1×veye along the eye line and 5×/1×vo orthogonally,
/// placing the rectangle above and outside the eye line like a brim.
fn hat_targets(leye: [f32; 2], reye: [f32; 2]) -> [[f64; 2]; 4] {
    let (veye, vo) = eye_basis(leye, reye);
    let (lx, ly) = (leye[0] as f64, leye[1] as f64);
    let (rx, ry) = (reye[0] as f64, reye[1] as f64);
    [
        [rx + veye[0] + 5.0 * vo[0], ry + veye[1] + 5.0 * vo[1]],
        [rx + veye[0] + vo[0], ry + veye[1] + vo[1]],
        [lx - veye[0] + 5.0 * vo[0], ly - veye[1] + 5.0 * vo[1]],
        [lx - veye[0] + vo[0], ly - veye[1] + vo[1]],
    ]
}

/// Firecracker targets: a `w_tar` × `h_tar` rectangle hanging below the
/// wrist, paired with [`corner_anchors`].
fn wrist_rect_targets(wrist: [f32; 2], w_tar: f64, h_tar: f64) -> [[f64; 2]; 4] {
    let (x, y) = (wrist[0] as f64, wrist[1] as f64);
    [
        [x - w_tar / 2.0, y],
        [x - w_tar / 2.0, y + h_tar],
        [x + w_tar / 2.0, y],
        [x + w_tar / 2.0, y + h_tar],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{detection, gradient_scene, solid_asset};
    use image::Rgba;

    const L: usize = 1;
    const R: usize = 2;

    fn eyes_detection(lscore: f32, rscore: f32) -> Detection {
        detection(
            [10.0, 10.0, 90.0, 90.0],
            &[(50.0, 70.0, 0.9), (30.0, 50.0, lscore), (70.0, 50.0, rscore)],
        )
    }

    #[test]
    fn test_gate_skips_subthreshold_detection() {
        let img = gradient_scene(100, 100);
        let dets = [eyes_detection(0.9, 0.3)];

        let out = apply_bugeye_effect(&img, &dets, L, R, 0.5).unwrap();
        assert_eq!(out, img, "sub-threshold detection must be a byte-identical no-op");

        let asset = solid_asset(20, 10, [0, 0, 0]);
        let out = apply_sunglasses_effect(&img, &dets, &asset, L, R, 0.5).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_keypoint_index_out_of_range_is_error() {
        let img = gradient_scene(32, 32);
        let dets = [eyes_detection(0.9, 0.9)];
        let err = apply_bugeye_effect(&img, &dets, L, 17, 0.5).unwrap_err();
        assert_eq!(err, EffectError::KeypointIndex { index: 17, len: 3 });
    }

    #[test]
    fn test_bugeye_localized_around_eyes() {
        let img = gradient_scene(100, 100);
        let dets = [eyes_detection(0.9, 0.9)];

        let out = apply_bugeye_effect(&img, &dets, L, R, 0.5).unwrap();
        assert_ne!(out, img, "eligible detection must distort the image");

        // Far from both anchors the remap displacement is a fraction of a
        // pixel; on the gentle test gradient that is at most a couple of
        // intensity levels of interpolation noise.
        for (x, y) in [(0u32, 0u32), (99, 0), (0, 99), (99, 99)] {
            let a = out.get_pixel(x, y);
            let b = img.get_pixel(x, y);
            for c in 0..3 {
                let diff = (a[c] as i16 - b[c] as i16).abs();
                assert!(diff <= 3, "corner ({}, {}) moved by {} levels", x, y, diff);
            }
        }
    }

    #[test]
    fn test_sequential_compounding_matches_two_passes() {
        let img = gradient_scene(100, 100);
        let det_a = eyes_detection(0.9, 0.9);
        let det_b = detection(
            [20.0, 20.0, 80.0, 80.0],
            &[(50.0, 30.0, 0.9), (40.0, 40.0, 0.9), (60.0, 40.0, 0.9)],
        );

        let both = apply_bugeye_effect(&img, &[det_a.clone(), det_b.clone()], L, R, 0.5).unwrap();

        let first = apply_bugeye_effect(&img, &[det_a], L, R, 0.5).unwrap();
        let second = apply_bugeye_effect(&first, &[det_b], L, R, 0.5).unwrap();

        assert_eq!(both, second, "detection 1's output must feed detection 2's input");
    }

    #[test]
    fn test_sunglasses_covers_midpoint_between_eyes() {
        let img = gradient_scene(100, 100);
        let dets = [eyes_detection(0.9, 0.9)];
        let asset = solid_asset(40, 20, [10, 10, 10]);

        let out = apply_sunglasses_effect(&img, &dets, &asset, L, R, 0.5).unwrap();

        // The target rectangle spans both eyes; its center (50, 50) maps to
        // the asset center, which is dark and passes the mask.
        assert_eq!(*out.get_pixel(50, 50), image::Rgb([10, 10, 10]));
        // Far corners stay untouched.
        assert_eq!(out.get_pixel(0, 99), img.get_pixel(0, 99));
    }

    #[test]
    fn test_hat_sits_above_eye_line() {
        let img = gradient_scene(120, 120);
        // COCO sides: the person's left eye appears on the image's right,
        // so the orthogonal offset points upward.
        let dets = [detection(
            [10.0, 10.0, 110.0, 110.0],
            &[(60.0, 90.0, 0.9), (75.0, 80.0, 0.9), (45.0, 80.0, 0.9)],
        )];
        // Opaque mid-gray asset: passes both the alpha gate and the gray
        // floor; one transparent pixel to exercise the alpha gate in place.
        let mut asset = image::RgbaImage::from_pixel(30, 30, Rgba([120, 120, 120, 255]));
        asset.put_pixel(15, 9, Rgba([120, 120, 120, 0]));

        let out = apply_hat_effect(&img, &dets, &asset, L, R, 0.5).unwrap();

        // veye = (-15, 0), vo = (0, -15): the brim rectangle spans
        // x in [30, 90], y in [5, 65], centered at (60, 35) above the eyes.
        assert_eq!(*out.get_pixel(60, 35), image::Rgb([120, 120, 120]));
        // The transparent asset pixel maps to (60, 5) and is rejected there.
        assert_eq!(out.get_pixel(60, 5), img.get_pixel(60, 5));
        // Below the warped footprint nothing changes.
        assert_eq!(out.get_pixel(60, 115), img.get_pixel(60, 115));
    }

    #[test]
    fn test_firecracker_one_sided_gating() {
        let img = gradient_scene(90, 90);
        // Keypoints: only indices 0 (left wrist) and 1 (right wrist) used.
        let dets = [detection(
            [0.0, 0.0, 90.0, 90.0],
            &[(20.0, 30.0, 0.9), (70.0, 30.0, 0.3)],
        )];
        let asset = solid_asset(10, 30, [50, 50, 50]);

        let out = apply_firecracker_effect(&img, &dets, &asset, 0, 1, 0.5).unwrap();

        // Left-wrist rectangle: 30px tall, 10px wide, hanging below (20, 30).
        assert_eq!(*out.get_pixel(20, 45), image::Rgb([50, 50, 50]));
        // Right side of the image untouched by this detection.
        for y in 0..90 {
            for x in 60..90 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_firecracker_both_wrists() {
        let img = gradient_scene(90, 90);
        let dets = [detection(
            [0.0, 0.0, 90.0, 90.0],
            &[(20.0, 30.0, 0.9), (70.0, 30.0, 0.9)],
        )];
        let asset = solid_asset(10, 30, [50, 50, 50]);

        let out = apply_firecracker_effect(&img, &dets, &asset, 0, 1, 0.5).unwrap();
        assert_eq!(*out.get_pixel(20, 45), image::Rgb([50, 50, 50]));
        assert_eq!(*out.get_pixel(70, 45), image::Rgb([50, 50, 50]));
    }

    #[test]
    fn test_overlay_compounding_later_occludes_earlier() {
        let img = gradient_scene(100, 100);
        let front = detection(
            [10.0, 10.0, 90.0, 90.0],
            &[(0.0, 0.0, 0.0), (30.0, 50.0, 0.9), (70.0, 50.0, 0.9)],
        );
        let back = detection(
            [10.0, 10.0, 90.0, 90.0],
            &[(0.0, 0.0, 0.0), (34.0, 52.0, 0.9), (74.0, 52.0, 0.9)],
        );
        let asset_dark = solid_asset(40, 20, [10, 10, 10]);

        let out = apply_sunglasses_effect(
            &img,
            &[front.clone(), back.clone()],
            &asset_dark,
            L,
            R,
            0.5,
        )
        .unwrap();

        // Where both rectangles overlap, the later detection wins: its
        // center pixel must hold asset content written in the second step.
        let seq_first = apply_sunglasses_effect(&img, &[front], &asset_dark, L, R, 0.5).unwrap();
        let seq_both = apply_sunglasses_effect(&seq_first, &[back], &asset_dark, L, R, 0.5).unwrap();
        assert_eq!(out, seq_both);
    }
}

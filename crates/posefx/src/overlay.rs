//! Homography patch overlay: asset warping, mask derivation, masked copy.
//!
//! The overlay path is shared by every patch effect: estimate the homography
//! from 4 asset anchors to 4 scene targets, warp the asset into a scene-sized
//! buffer by inverse mapping (out-of-footprint pixels take a transparent
//! white fill), derive a binary mask from a [`MaskPolicy`], and hard-copy the
//! admitted pixels onto the scene. No alpha blending; edges are hard-masked.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::homography::{estimate_homography_dlt, project, HomographyError};

/// BT.601 luma in [0, 255]; the mask thresholds are calibrated against it.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Which warped-buffer pixels count as genuine asset content.
///
/// The thresholds are empirical, tunable constants, not structural ones;
/// see the per-effect defaults in [`crate::effects`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Admit pixels whose grayscale intensity is strictly below the
    /// threshold. For white-background assets: the fill and the background
    /// both read as bright and are rejected.
    GrayBelow(u8),
    /// Admit pixels with alpha strictly above `min_alpha` whose grayscale is
    /// strictly above `min_gray`. The grayscale floor rejects near-white
    /// asset pixels that survive alpha masking.
    AlphaAndGray { min_alpha: u8, min_gray: u8 },
}

impl MaskPolicy {
    /// Mask predicate for one warped pixel.
    #[inline]
    pub fn admits(&self, px: Rgba<u8>) -> bool {
        let [r, g, b, a] = px.0;
        match *self {
            Self::GrayBelow(thr) => luma(r, g, b) < thr as f32,
            Self::AlphaAndGray { min_alpha, min_gray } => {
                a > min_alpha && luma(r, g, b) > min_gray as f32
            }
        }
    }
}

/// Quadrant-center source anchors at 30%/70% of the asset extent, in the
/// canonical order paired with eye-derived targets (sunglasses, hat).
pub fn quadrant_anchors(width: u32, height: u32) -> [[f64; 2]; 4] {
    let (w, h) = (width as f64, height as f64);
    [
        [0.3 * w, 0.3 * h],
        [0.3 * w, 0.7 * h],
        [0.7 * w, 0.3 * h],
        [0.7 * w, 0.7 * h],
    ]
}

/// Full-extent corner source anchors, same canonical order (firecracker).
pub fn corner_anchors(width: u32, height: u32) -> [[f64; 2]; 4] {
    let (w, h) = (width as f64, height as f64);
    [[0.0, 0.0], [0.0, h], [w, 0.0], [w, h]]
}

/// Warp `asset` into a scene-sized RGBA buffer through the homography that
/// maps `src` anchors onto `dst` anchors.
///
/// Uses inverse mapping: each output pixel samples the asset bilinearly at
/// H⁻¹ · (x, y). Pixels outside the reprojected asset footprint take a
/// transparent white fill, distinguishable from asset content under both
/// mask policies (white fails the gray ceiling, alpha 0 fails the alpha
/// gate). A singular homography yields an all-fill buffer — the degenerate
/// geometry surfaces as a no-op overlay.
pub fn warp_asset(
    asset: &RgbaImage,
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
    scene_width: u32,
    scene_height: u32,
) -> Result<RgbaImage, HomographyError> {
    const FILL: Rgba<u8> = Rgba([255, 255, 255, 0]);

    let h = estimate_homography_dlt(src, dst)?;
    let mut out = RgbaImage::from_pixel(scene_width, scene_height, FILL);

    let h_inv = match h.try_inverse() {
        Some(m) => m,
        None => return Ok(out),
    };

    for y in 0..scene_height {
        for x in 0..scene_width {
            let p = project(&h_inv, x as f64, y as f64);
            if let Some(px) = bilinear_sample_rgba_checked(asset, p[0] as f32, p[1] as f32) {
                out.put_pixel(x, y, px);
            }
        }
    }
    Ok(out)
}

/// Masked copy: wherever `policy` admits the warped pixel, overwrite the
/// scene pixel with its color channels. Everything else is left untouched.
pub fn composite_masked(scene: &mut RgbImage, patch: &RgbaImage, policy: MaskPolicy) {
    debug_assert_eq!(scene.dimensions(), patch.dimensions());
    for (x, y, px) in patch.enumerate_pixels() {
        if policy.admits(*px) {
            scene.put_pixel(x, y, Rgb([px[0], px[1], px[2]]));
        }
    }
}

/// Warp + mask + composite in one step: one overlay invocation for one
/// eligible detection (or side).
pub fn overlay_patch(
    scene: &mut RgbImage,
    asset: &RgbaImage,
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
    policy: MaskPolicy,
) -> Result<(), HomographyError> {
    let (w, h) = scene.dimensions();
    let patch = warp_asset(asset, src, dst, w, h)?;
    composite_masked(scene, &patch, policy);
    Ok(())
}

/// Promote a white-background RGB asset to RGBA with full opacity.
pub(crate) fn with_opaque_alpha(asset: &RgbImage) -> RgbaImage {
    let mut out = RgbaImage::new(asset.width(), asset.height());
    for (x, y, px) in asset.enumerate_pixels() {
        out.put_pixel(x, y, Rgba([px[0], px[1], px[2], 255]));
    }
    out
}

/// Sample an RGBA image at a sub-pixel position using bilinear
/// interpolation, or `None` if sampling is out of bounds.
#[inline]
fn bilinear_sample_rgba_checked(img: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (w, h) = img.dimensions();
    if !(x >= 0.0 && y >= 0.0) {
        return None;
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    if x0 + 1 >= w || y0 + 1 >= h {
        return None;
    }
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x0 + 1, y0);
    let p01 = img.get_pixel(x0, y0 + 1);
    let p11 = img.get_pixel(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let v = (1.0 - fx) * (1.0 - fy) * p00[c] as f32
            + fx * (1.0 - fy) * p10[c] as f32
            + (1.0 - fx) * fy * p01[c] as f32
            + fx * fy * p11[c] as f32;
        *slot = v.round() as u8;
    }
    Some(Rgba(out))
}

//! Coordinate remap fields: radial pinch distortion and image resampling.

use image::{Rgb, RgbImage};

/// Per-pixel source-coordinate grids for image resampling.
///
/// Entry `(x, y)` gives the source position the output pixel samples from.
/// A field is built fresh per distortion application, consumed by
/// [`RemapField::remap`], and discarded; it never outlives the image
/// dimensions it was built for.
#[derive(Debug, Clone)]
pub struct RemapField {
    width: u32,
    height: u32,
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl RemapField {
    /// Identity field: every pixel samples from itself.
    pub fn identity(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize);
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for y in 0..height {
            for x in 0..width {
                xs.push(x as f32);
                ys.push(y as f32);
            }
        }
        Self {
            width,
            height,
            xs,
            ys,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source coordinate for output pixel `(x, y)`.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> [f32; 2] {
        let i = (y * self.width + x) as usize;
        [self.xs[i], self.ys[i]]
    }

    /// Fold a radial pinch centered at `center` into the field.
    ///
    /// Every grid coordinate moves toward the anchor:
    /// `new = (cur - c) / (1 + k1 / r_norm) + c`, with
    /// `r_norm = (r² + eps) / scale` measured from the *current* grid value,
    /// so successive pinches compose. `eps` regularizes the anchor itself
    /// (r² = 0 keeps the anchor a fixed point); `scale` is typically the
    /// squared bounding-box diagonal, adapting the pinch radius to the
    /// subject's apparent size.
    pub fn pinch(&mut self, center: [f32; 2], k1: f32, eps: f32, scale: f32) {
        let [cx, cy] = center;
        for i in 0..self.xs.len() {
            let dx = self.xs[i] - cx;
            let dy = self.ys[i] - cy;
            let r_norm = (dx * dx + dy * dy + eps) / scale;
            let denom = 1.0 + k1 / r_norm;
            self.xs[i] = dx / denom + cx;
            self.ys[i] = dy / denom + cy;
        }
    }

    /// Resample `img` through the field with bilinear interpolation.
    ///
    /// Out-of-bounds source coordinates replicate the nearest edge pixel.
    /// The output has the field's dimensions, which must match the image.
    pub fn remap(&self, img: &RgbImage) -> RgbImage {
        debug_assert_eq!((img.width(), img.height()), (self.width, self.height));
        let mut out = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let [sx, sy] = self.at(x, y);
                out.put_pixel(x, y, bilinear_sample_clamped(img, sx, sy));
            }
        }
        out
    }
}

/// Sample an RGB image at a sub-pixel position using bilinear interpolation,
/// clamping the coordinate to the image bounds (edge replication).
#[inline]
pub(crate) fn bilinear_sample_clamped(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (w, h) = img.dimensions();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let v = (1.0 - fx) * (1.0 - fy) * p00[c] as f32
            + fx * (1.0 - fy) * p10[c] as f32
            + (1.0 - fx) * fy * p01[c] as f32
            + fx * fy * p11[c] as f32;
        *slot = v.round() as u8;
    }
    Rgb(out)
}

//! Composite a synthetic sunglasses asset onto a synthetic scene.
//!
//! Everything is generated in memory, so the example runs without input
//! files. Writes `sunglasses_demo.png` to the current directory.

use image::{Rgb, RgbImage};
use posefx::{apply_sunglasses_effect, coco, Detection, Keypoint, DEFAULT_KPT_THR};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scene = RgbImage::from_fn(320, 240, |x, y| {
        Rgb([(x / 2) as u8, (y / 2) as u8, ((x + y) / 4) as u8])
    });

    // White-background asset: two dark lenses joined by a bridge.
    let mut asset = RgbImage::from_pixel(120, 60, Rgb([255, 255, 255]));
    for y in 18..42 {
        for x in 10..110 {
            let in_bridge = (50..70).contains(&x) && !(27..33).contains(&y);
            if !in_bridge {
                asset.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
    }

    // One person facing the camera: the left eye sits on the image's right.
    let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); coco::COUNT];
    keypoints[coco::LEFT_EYE] = Keypoint::new(190.0, 100.0, 0.95);
    keypoints[coco::RIGHT_EYE] = Keypoint::new(130.0, 100.0, 0.95);
    let det = Detection {
        bbox: [80.0, 40.0, 240.0, 220.0],
        bbox_score: Some(0.99),
        keypoints,
    };

    let out = apply_sunglasses_effect(
        &scene,
        &[det],
        &asset,
        coco::LEFT_EYE,
        coco::RIGHT_EYE,
        DEFAULT_KPT_THR,
    )?;
    out.save("sunglasses_demo.png")?;
    println!("wrote sunglasses_demo.png");
    Ok(())
}

//! Pose estimation results: keypoints, detections, confidence gating.
//!
//! Keypoint indices are caller-supplied configuration rather than a hardcoded
//! body-part enum: upstream detectors disagree on keypoint ordering, and the
//! index mapping is the seam that keeps this crate detector-agnostic. The
//! [`coco`] module provides the common COCO-17 ordering as named constants.

use serde::{Deserialize, Serialize};

/// Keypoint indices for the COCO-17 body-part schema.
///
/// Convenience only; every effect takes explicit indices.
pub mod coco {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE: usize = 1;
    pub const RIGHT_EYE: usize = 2;
    pub const LEFT_EAR: usize = 3;
    pub const RIGHT_EAR: usize = 4;
    pub const LEFT_SHOULDER: usize = 5;
    pub const RIGHT_SHOULDER: usize = 6;
    pub const LEFT_ELBOW: usize = 7;
    pub const RIGHT_ELBOW: usize = 8;
    pub const LEFT_WRIST: usize = 9;
    pub const RIGHT_WRIST: usize = 10;
    pub const LEFT_HIP: usize = 11;
    pub const RIGHT_HIP: usize = 12;
    pub const LEFT_KNEE: usize = 13;
    pub const RIGHT_KNEE: usize = 14;
    pub const LEFT_ANKLE: usize = 15;
    pub const RIGHT_ANKLE: usize = 16;

    /// Number of keypoints in the schema.
    pub const COUNT: usize = 17;
}

/// A single detected body keypoint in scene pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// X position (pixels).
    pub x: f32,
    /// Y position (pixels).
    pub y: f32,
    /// Confidence score, usually in [0, 1]; unbounded scores are accepted
    /// and compared against the gate threshold as-is.
    pub score: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }

    /// Position as a 2D point for the geometry code.
    #[inline]
    pub fn xy(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// One detected person: bounding box plus detector-ordered keypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box [x1, y1, x2, y2] in pixels.
    pub bbox: [f32; 4],
    /// Optional box detection score (unused by the effects themselves).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox_score: Option<f32>,
    /// Keypoints indexed by the upstream detector's body-part schema.
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    /// Keypoint at `index`, or `None` if the index is outside this
    /// detection's keypoint sequence.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Keypoint> {
        self.keypoints.get(index).copied()
    }

    /// Squared bounding-box diagonal (pixels²).
    ///
    /// Normalizes the bug-eye distortion radius so the effect scales with
    /// the subject's apparent size.
    pub fn bbox_diag_sq(&self) -> f32 {
        let [x1, y1, x2, y2] = self.bbox;
        (x2 - x1).powi(2) + (y2 - y1).powi(2)
    }
}

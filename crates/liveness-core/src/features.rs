//! Geometric features computed from a normalized landmark set.
//!
//! All formulas work on (x, y) in pixel space. They are engineering
//! approximations from a single frontal frame, not a calibrated pose estimate.
//!
//! Degenerate geometry (a zero-length denominator) never faults: ratios fall
//! back to `0.0`, angles fall back to `0.0`, and the rest of the frame stays
//! usable.

use crate::landmarks::{
    LEFT_EYE, LEFT_IRIS_CENTER, MOUTH, MOUTH_LEFT_CORNER, MOUTH_RIGHT_CORNER, NOSE_TIP, RIGHT_EYE,
    RIGHT_IRIS_CENTER,
};
use crate::types::{FeatureSet, LandmarkPoint, LandmarkSet};

/// Ratio of an 8-point contour plus whether its denominator was degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourRatio {
    pub value: f64,
    pub degenerate: bool,
}

/// Ratio primitive shared by the eye and mouth metrics.
///
/// `points[0]` and `points[4]` are the contour corners; the three pairs
/// `(1,5) (2,6) (3,7)` are measured across the opening:
///
/// ```text
/// ratio = (|p1-p5| + |p2-p6| + |p3-p7|) / (3 * |p0-p4|)
/// ```
pub fn contour_ratio(points: &[LandmarkPoint; 8]) -> ContourRatio {
    let span = points[0].distance(&points[4]);
    if span == 0.0 || !span.is_finite() {
        return ContourRatio {
            value: 0.0,
            degenerate: true,
        };
    }

    let g1 = points[1].distance(&points[5]);
    let g2 = points[2].distance(&points[6]);
    let g3 = points[3].distance(&points[7]);

    ContourRatio {
        value: (g1 + g2 + g3) / (3.0 * span),
        degenerate: false,
    }
}

/// Head rotation angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadPose {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Five-point head pose: iris centres, nose tip, mouth corners.
///
/// "Left" and "right" are image sides here: `left_eye` and `left_mouth` are
/// the points with the smaller x in a frontal view. The eye line defines
/// roll. All points are then de-rolled around the nose tip, and yaw/pitch
/// come from where the nose sits between the eye and mouth points: a centred
/// nose reads as 0°, the extremes as ±90°.
pub fn head_pose(
    left_eye: LandmarkPoint,
    right_eye: LandmarkPoint,
    nose: LandmarkPoint,
    left_mouth: LandmarkPoint,
    right_mouth: LandmarkPoint,
) -> HeadPose {
    let dx_eyes = (right_eye.x - left_eye.x).max(1.0);
    let dy_eyes = right_eye.y - left_eye.y;
    let angle = dy_eyes.atan2(dx_eyes);

    let (sin, cos) = angle.sin_cos();
    // Rotate by -angle around the nose tip.
    let derotate = |p: LandmarkPoint| -> (f64, f64) {
        let x = p.x - nose.x;
        let y = p.y - nose.y;
        (cos * x + sin * y + nose.x, -sin * x + cos * y + nose.y)
    };

    let r = [
        derotate(left_eye),
        derotate(right_eye),
        derotate(nose),
        derotate(left_mouth),
        derotate(right_mouth),
    ];

    let dx_tot = ((r[1].0 - r[0].0) + (r[4].0 - r[3].0)) / 2.0;
    let dy_tot = ((r[3].1 - r[0].1) + (r[4].1 - r[1].1)) / 2.0;
    let dx_nose = ((r[1].0 - r[2].0) + (r[4].0 - r[2].0)) / 2.0;
    let dy_nose = ((r[3].1 - r[2].1) + (r[4].1 - r[2].1)) / 2.0;

    let yaw = if dx_tot != 0.0 {
        -90.0 + 180.0 * dx_nose / dx_tot
    } else {
        0.0
    };
    let pitch = if dy_tot != 0.0 {
        -90.0 + 180.0 * dy_nose / dy_tot
    } else {
        0.0
    };

    HeadPose {
        roll: angle.to_degrees(),
        pitch: finite_or_zero(pitch),
        yaw: finite_or_zero(yaw),
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Turns normalized landmarks into a [`FeatureSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Compute the features of one frame. `None` when the set is empty or
    /// lacks a referenced index.
    pub fn extract(&self, landmarks: &LandmarkSet) -> Option<FeatureSet> {
        if landmarks.is_empty() {
            return None;
        }

        let left = contour_ratio(&gather(landmarks, &LEFT_EYE)?);
        let right = contour_ratio(&gather(landmarks, &RIGHT_EYE)?);
        let mouth = contour_ratio(&gather(landmarks, &MOUTH)?);

        // Mirroring swaps which side of the image each eye lands on; order
        // the pairs left-to-right so the eye line has positive extent.
        let (subject_right_iris, subject_left_iris) = (
            *landmarks.get(RIGHT_IRIS_CENTER)?,
            *landmarks.get(LEFT_IRIS_CENTER)?,
        );
        let (subject_right_mouth, subject_left_mouth) = (
            *landmarks.get(MOUTH_RIGHT_CORNER)?,
            *landmarks.get(MOUTH_LEFT_CORNER)?,
        );
        let nose = *landmarks.get(NOSE_TIP)?;

        let pose = if subject_right_iris.x <= subject_left_iris.x {
            head_pose(
                subject_right_iris,
                subject_left_iris,
                nose,
                subject_right_mouth,
                subject_left_mouth,
            )
        } else {
            head_pose(
                subject_left_iris,
                subject_right_iris,
                nose,
                subject_left_mouth,
                subject_right_mouth,
            )
        };

        Some(FeatureSet {
            ear: (left.value + right.value) / 2.0,
            mar: mouth.value,
            roll: pose.roll,
            pitch: pose.pitch,
            yaw: pose.yaw,
            ear_degenerate: left.degenerate || right.degenerate,
            mar_degenerate: mouth.degenerate,
        })
    }
}

fn gather(landmarks: &LandmarkSet, indices: &[usize; 8]) -> Option<[LandmarkPoint; 8]> {
    let mut out = [LandmarkPoint::default(); 8];
    for (slot, &i) in out.iter_mut().zip(indices.iter()) {
        *slot = *landmarks.get(i)?;
    }
    Some(out)
}

//! Canonical face topology indices and per-frame landmark normalization.
//!
//! The detector reports landmarks in unit-square coordinates relative to the
//! source frame. Feature formulas need horizontal and vertical distances in
//! the same units, so the normalizer scales by the frame dimensions (pixel
//! space). When the feed is shown mirrored to the user, x is flipped first so
//! that "left" landmarks land on the user's own left.

use crate::error::FrameError;
use crate::types::{LandmarkPoint, LandmarkSet};

/// Number of points in the base face mesh.
pub const BASE_LANDMARK_COUNT: usize = 468;
/// Number of points when iris refinement is enabled.
pub const REFINED_LANDMARK_COUNT: usize = 478;

// Sides are the subject's own left and right.

/// Left-eye contour: corners at positions 0 and 4, lid pairs (1,5) (2,6) (3,7).
pub const LEFT_EYE: [usize; 8] = [263, 385, 386, 387, 362, 380, 374, 373];
/// Right-eye contour, same layout as [`LEFT_EYE`].
pub const RIGHT_EYE: [usize; 8] = [33, 160, 159, 158, 133, 144, 145, 153];
/// Mouth contour: corners at positions 0 and 4, lip pairs (1,5) (2,6) (3,7).
pub const MOUTH: [usize; 8] = [61, 81, 13, 311, 291, 178, 14, 402];

pub const RIGHT_IRIS_CENTER: usize = 468;
pub const LEFT_IRIS_CENTER: usize = 473;
pub const NOSE_TIP: usize = 4;
pub const MOUTH_RIGHT_CORNER: usize = 61;
pub const MOUTH_LEFT_CORNER: usize = 291;

/// Minimum number of landmarks a frame must carry to be evaluated.
pub fn required_landmarks(require_iris: bool) -> usize {
    if require_iris {
        LEFT_IRIS_CENTER + 1
    } else {
        BASE_LANDMARK_COUNT
    }
}

/// Maps raw detector landmarks into the pixel space used by the extractor.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkNormalizer {
    mirror: bool,
    require_iris: bool,
}

impl LandmarkNormalizer {
    pub fn new(mirror: bool, require_iris: bool) -> Self {
        Self {
            mirror,
            require_iris,
        }
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn require_iris(&self) -> bool {
        self.require_iris
    }

    /// Normalize a frame, returning an empty set for anything unusable.
    pub fn normalize(
        &self,
        raw: &[LandmarkPoint],
        frame_width: u32,
        frame_height: u32,
    ) -> LandmarkSet {
        self.try_normalize(raw, frame_width, frame_height)
            .unwrap_or_else(|_| LandmarkSet::empty())
    }

    /// Normalize a frame, reporting why it could not be used.
    pub fn try_normalize(
        &self,
        raw: &[LandmarkPoint],
        frame_width: u32,
        frame_height: u32,
    ) -> Result<LandmarkSet, FrameError> {
        if raw.is_empty() {
            return Err(FrameError::Empty);
        }

        let need = required_landmarks(self.require_iris);
        if raw.len() < need {
            return Err(FrameError::TooFewLandmarks {
                got: raw.len(),
                need,
            });
        }

        if frame_width == 0 || frame_height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: frame_width,
                height: frame_height,
            });
        }

        let w = f64::from(frame_width);
        let h = f64::from(frame_height);

        let mut points = Vec::with_capacity(raw.len().max(REFINED_LANDMARK_COUNT));
        for (i, p) in raw.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(FrameError::NonFinite(i));
            }
            let x = if self.mirror { 1.0 - p.x } else { p.x };
            points.push(LandmarkPoint {
                x: x * w,
                y: p.y * h,
                z: p.z,
            });
        }

        // Without iris refinement, stand in for the iris centres with the
        // midpoints of the matching eye corners.
        if points.len() <= LEFT_IRIS_CENTER {
            points.resize(REFINED_LANDMARK_COUNT, LandmarkPoint::default());
            points[RIGHT_IRIS_CENTER] = points[RIGHT_EYE[0]].midpoint(&points[RIGHT_EYE[4]]);
            points[LEFT_IRIS_CENTER] = points[LEFT_EYE[0]].midpoint(&points[LEFT_EYE[4]]);
        }

        Ok(LandmarkSet::new(points))
    }
}

impl Default for LandmarkNormalizer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

//! Passive eye-motion tracking across recent frames.
//!
//! A printed photograph or a frozen video frame yields near-identical iris
//! positions frame after frame, while a live person shows involuntary eye
//! drift even when holding still. The tracker keeps the last few iris-centre
//! positions and reports their mean per-frame displacement, which the session
//! can use to refuse crediting a challenge to a perfectly still image.
//!
//! This only raises the bar for static spoofs. Video replay moves the
//! landmarks and passes.

use std::collections::VecDeque;

use crate::landmarks::{LEFT_IRIS_CENTER, RIGHT_IRIS_CENTER};
use crate::types::{LandmarkPoint, LandmarkSet};

/// Frames kept for the displacement average.
pub const DEFAULT_MOTION_WINDOW: usize = 8;

/// Rolling window of iris-centre positions.
#[derive(Debug, Clone)]
pub struct EyeMotionTracker {
    window: usize,
    samples: VecDeque<[LandmarkPoint; 2]>,
}

impl EyeMotionTracker {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    /// Record the iris centres of a normalized frame. Empty sets are ignored.
    pub fn observe(&mut self, landmarks: &LandmarkSet) {
        let (Some(left), Some(right)) = (
            landmarks.get(LEFT_IRIS_CENTER),
            landmarks.get(RIGHT_IRIS_CENTER),
        ) else {
            return;
        };

        self.samples.push_back([*left, *right]);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
    }

    /// Mean displacement of both iris centres between consecutive frames.
    ///
    /// `None` until at least two frames have been observed, since a single
    /// frame says nothing about motion.
    pub fn mean_displacement(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }

        let mut total = 0.0;
        let mut pairs = 0usize;
        for (prev, curr) in self.samples.iter().zip(self.samples.iter().skip(1)) {
            let left = prev[0].distance(&curr[0]);
            let right = prev[1].distance(&curr[1]);
            total += (left + right) / 2.0;
            pairs += 1;
        }

        Some(total / pairs as f64)
    }

    /// Whether the recent frames move at least `min_displacement` pixels on
    /// average. Undetermined windows pass.
    pub fn is_moving(&self, min_displacement: f64) -> bool {
        self.mean_displacement()
            .map_or(true, |mean| mean >= min_displacement)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

impl Default for EyeMotionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MOTION_WINDOW)
    }
}

#![allow(dead_code)]

use std::time::Duration;

use liveness_core::landmarks::{
    LEFT_EYE, LEFT_IRIS_CENTER, MOUTH, NOSE_TIP, REFINED_LANDMARK_COUNT, RIGHT_EYE,
    RIGHT_IRIS_CENTER,
};
use liveness_core::{ActionKind, LandmarkPoint, LivenessSession, SessionConfig};

pub const FRAME: u32 = 1000;
pub const COOLDOWN: Duration = Duration::from_millis(2000);
/// Comfortably past the cooldown.
pub const STEP: Duration = Duration::from_millis(3000);

/// A frontal face drawn in a 1000x1000 frame, in pixels.
///
/// Eye contours are 100 px wide, so EAR = `eye_gap / 100`. The mouth is
/// 200 px wide, so MAR = `mouth_gap / 200`. Moving the nose off centre turns
/// into yaw (`nose_dx`) and pitch (`nose_dy`).
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFace {
    pub eye_gap: f64,
    pub mouth_gap: f64,
    pub nose_dx: f64,
    pub nose_dy: f64,
    /// Added to both iris centres, for motion tests.
    pub iris_offset: (f64, f64),
    /// Uniform scale around the frame centre.
    pub scale: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            eye_gap: 30.0,
            mouth_gap: 20.0,
            nose_dx: 0.0,
            nose_dy: 0.0,
            iris_offset: (0.0, 0.0),
            scale: 1.0,
        }
    }
}

impl SyntheticFace {
    pub fn neutral() -> Self {
        Self::default()
    }

    /// A face that satisfies exactly `action` under default thresholds.
    pub fn performing(action: ActionKind) -> Self {
        let mut f = Self::default();
        match action {
            ActionKind::Blink => f.eye_gap = 10.0,
            ActionKind::OpenMouth => f.mouth_gap = 150.0,
            ActionKind::ShakeHead => f.nose_dx = -60.0,
            ActionKind::Nod => f.nose_dy = -60.0,
        }
        f
    }

    /// Pixel-space landmarks.
    pub fn pixels(&self) -> Vec<LandmarkPoint> {
        let mut pts = vec![LandmarkPoint::new(500.0, 500.0); REFINED_LANDMARK_COUNT];

        place_contour(&mut pts, &RIGHT_EYE, (300.0, 400.0), (400.0, 400.0), self.eye_gap);
        place_contour(&mut pts, &LEFT_EYE, (700.0, 400.0), (600.0, 400.0), self.eye_gap);
        place_contour(&mut pts, &MOUTH, (400.0, 700.0), (600.0, 700.0), self.mouth_gap);

        let (ox, oy) = self.iris_offset;
        pts[RIGHT_IRIS_CENTER] = LandmarkPoint::new(350.0 + ox, 400.0 + oy);
        pts[LEFT_IRIS_CENTER] = LandmarkPoint::new(650.0 + ox, 400.0 + oy);
        pts[NOSE_TIP] = LandmarkPoint::new(500.0 + self.nose_dx, 550.0 + self.nose_dy);

        for p in &mut pts {
            p.x = 500.0 + (p.x - 500.0) * self.scale;
            p.y = 500.0 + (p.y - 500.0) * self.scale;
        }
        pts
    }

    /// Unit-square landmarks, as a detector would report them.
    pub fn raw(&self) -> Vec<LandmarkPoint> {
        self.pixels()
            .into_iter()
            .map(|p| LandmarkPoint::new(p.x / f64::from(FRAME), p.y / f64::from(FRAME)))
            .collect()
    }
}

/// Corners at `a` and `b`; the three measurement pairs sit at 1/4, 1/2, 3/4
/// between them, `gap` apart vertically.
fn place_contour(
    pts: &mut [LandmarkPoint],
    indices: &[usize; 8],
    a: (f64, f64),
    b: (f64, f64),
    gap: f64,
) {
    pts[indices[0]] = LandmarkPoint::new(a.0, a.1);
    pts[indices[4]] = LandmarkPoint::new(b.0, b.1);
    for k in 1..=3 {
        let t = k as f64 / 4.0;
        let x = a.0 + (b.0 - a.0) * t;
        let y = a.1 + (b.1 - a.1) * t;
        pts[indices[k]] = LandmarkPoint::new(x, y - gap / 2.0);
        pts[indices[k + 4]] = LandmarkPoint::new(x, y + gap / 2.0);
    }
}

pub fn config(seed: u64) -> SessionConfig {
    SessionConfig {
        mirror: Some(false),
        seed: Some(seed),
        cooldown_ms: COOLDOWN.as_millis() as u64,
        ..SessionConfig::default()
    }
}

pub fn started_session(seed: u64) -> LivenessSession {
    let mut s = LivenessSession::new(config(seed)).expect("valid config");
    s.start();
    s
}

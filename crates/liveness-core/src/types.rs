use serde::{Deserialize, Serialize};
use std::fmt;

/// A single landmark in the canonical face topology.
///
/// Raw detector output uses unit-square coordinates; after normalization the
/// same type carries pixel-space coordinates. `z` is carried through but never
/// read by the feature formulas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance in the (x, y) plane.
    pub fn distance(&self, other: &LandmarkPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &LandmarkPoint) -> LandmarkPoint {
        LandmarkPoint {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }
}

/// Normalized landmarks for one frame, indexed by canonical landmark index.
///
/// Produced fresh by [`crate::LandmarkNormalizer`] every frame. An empty set
/// means there is nothing to evaluate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }
}

/// Per-frame geometric features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSet {
    /// Eye aspect ratio, averaged over both eyes. Lower means more closed.
    pub ear: f64,
    /// Mouth aspect ratio. Higher means more open.
    pub mar: f64,
    /// Head roll in degrees.
    pub roll: f64,
    /// Head pitch in degrees.
    pub pitch: f64,
    /// Head yaw in degrees.
    pub yaw: f64,
    /// At least one eye contour had a zero span; `ear` is a fallback value.
    pub ear_degenerate: bool,
    /// The mouth contour had a zero span; `mar` is a fallback value.
    pub mar_degenerate: bool,
}

/// One physical challenge the user must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Blink,
    OpenMouth,
    ShakeHead,
    Nod,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Blink,
        ActionKind::OpenMouth,
        ActionKind::ShakeHead,
        ActionKind::Nod,
    ];

    /// Stable identifier a presentation layer can key its message table on.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Blink => "blink",
            Self::OpenMouth => "open_mouth",
            Self::ShakeHead => "shake_head",
            Self::Nod => "nod",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

//! Challenge-response liveness detection.
//!
//! Consumes per-frame facial landmarks from an external detector, computes
//! eye/mouth aspect ratios and an approximate head pose, and walks the user
//! through four randomized challenges (blink, open mouth, shake head, nod).
//!
//! This verifies that a short geometric motion happened. It does not defend
//! against video replay or 3D masks.

pub mod challenge;
pub mod config;
pub mod error;
pub mod features;
pub mod landmarks;
pub mod motion;
pub mod session;
pub mod types;

pub use challenge::{ChallengePhase, ChallengeState, ChallengeStateMachine, TransitionEvent};
pub use config::{Facing, SessionConfig, Thresholds};
pub use error::{ConfigError, FrameError};
pub use features::FeatureExtractor;
pub use landmarks::LandmarkNormalizer;
pub use session::{LivenessSession, SessionResult};
pub use types::{ActionKind, FeatureSet, LandmarkPoint, LandmarkSet};

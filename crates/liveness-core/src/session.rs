use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use crate::challenge::{ChallengeState, ChallengeStateMachine, TransitionEvent};
use crate::config::SessionConfig;
use crate::error::ConfigError;
use crate::features::FeatureExtractor;
use crate::landmarks::LandmarkNormalizer;
use crate::motion::EyeMotionTracker;
use crate::types::{ActionKind, FeatureSet, LandmarkPoint};

/// Session status after a frame, read by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    /// Completed actions in completion order, without duplicates.
    pub completed_actions: Vec<ActionKind>,
    pub is_complete: bool,
    /// The action to instruct the user to perform.
    pub current_action: Option<ActionKind>,
    /// The last completion is still cooling down; detection is paused.
    pub in_cooldown: bool,
    pub frames_seen: u64,
    pub frames_skipped: u64,
    /// Features of the most recently evaluated frame.
    pub features: Option<FeatureSet>,
    /// Mean iris displacement over the recent window, in pixels per frame.
    pub eye_motion: Option<f64>,
    /// Challenge change caused by this frame.
    pub transition: Option<TransitionEvent>,
}

impl SessionResult {
    pub fn completed_count(&self) -> usize {
        self.completed_actions.len()
    }
}

/// One liveness check: feed it a frame at a time until it reports complete.
///
/// Not re-entrant; the capture loop calls [`on_frame`](Self::on_frame) once
/// per frame and waits for it to return. Frame-level problems never surface as
/// errors: the frame is skipped and counted.
pub struct LivenessSession {
    id: Uuid,
    config: SessionConfig,
    normalizer: LandmarkNormalizer,
    extractor: FeatureExtractor,
    machine: ChallengeStateMachine,
    motion: EyeMotionTracker,
    accepting: bool,
    frames_seen: u64,
    frames_skipped: u64,
    last_features: Option<FeatureSet>,
}

impl LivenessSession {
    /// Build a session. Invalid thresholds are rejected here; the session does
    /// not accept frames until [`start`](Self::start).
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let normalizer = LandmarkNormalizer::new(config.mirror(), config.require_iris);
        let machine =
            ChallengeStateMachine::new(config.thresholds, config.cooldown(), config.seed);

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            normalizer,
            extractor: FeatureExtractor,
            machine,
            motion: EyeMotionTracker::default(),
            accepting: false,
            frames_seen: 0,
            frames_skipped: 0,
            last_features: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Reset all challenge state and begin accepting frames.
    pub fn start(&mut self) {
        self.machine.reset();
        self.motion.reset();
        self.frames_seen = 0;
        self.frames_skipped = 0;
        self.last_features = None;
        self.accepting = true;
        tracing::info!(session = %self.id, facing = ?self.config.facing, "liveness session started");
    }

    /// Stop accepting frames. Recorded results are kept.
    pub fn stop(&mut self) {
        if self.accepting {
            self.accepting = false;
            tracing::info!(
                session = %self.id,
                completed = self.machine.completed().len(),
                "liveness session stopped"
            );
        }
    }

    /// Run one frame through normalize → extract → challenge.
    ///
    /// `raw` is the detector output in unit-square coordinates; `now` must come
    /// from a monotonic clock.
    pub fn on_frame(
        &mut self,
        raw: &[LandmarkPoint],
        frame_width: u32,
        frame_height: u32,
        now: Instant,
    ) -> SessionResult {
        if !self.accepting {
            return self.result(None);
        }
        self.frames_seen += 1;

        let landmarks = match self.normalizer.try_normalize(raw, frame_width, frame_height) {
            Ok(set) => set,
            Err(e) => {
                self.frames_skipped += 1;
                tracing::trace!(session = %self.id, error = %e, "frame skipped");
                return self.result(None);
            }
        };

        self.motion.observe(&landmarks);

        let Some(features) = self.extractor.extract(&landmarks) else {
            self.frames_skipped += 1;
            tracing::trace!(session = %self.id, "frame skipped: landmarks incomplete");
            return self.result(None);
        };
        tracing::trace!(session = %self.id, ?features, "frame features");
        self.last_features = Some(features);

        let allow_credit = match self.config.min_eye_motion {
            Some(min) => self.motion.is_moving(min),
            None => true,
        };

        let transition = {
            let _span = tracing::info_span!("challenge", session = %self.id).entered();
            self.machine.step(Some(&features), now, allow_credit)
        };
        if transition.is_some() && self.machine.is_complete() {
            tracing::info!(session = %self.id, frames = self.frames_seen, "liveness session complete");
        }

        self.result(transition)
    }

    /// Current status without processing a frame.
    pub fn result(&self, transition: Option<TransitionEvent>) -> SessionResult {
        SessionResult {
            completed_actions: self.machine.completed().to_vec(),
            is_complete: self.machine.is_complete(),
            current_action: self.machine.current_action(),
            in_cooldown: self.machine.in_cooldown(),
            frames_seen: self.frames_seen,
            frames_skipped: self.frames_skipped,
            features: self.last_features,
            eye_motion: self.motion.mean_displacement(),
            transition,
        }
    }

    pub fn challenge_state(&self) -> ChallengeState {
        self.machine.state()
    }
}

//! Randomized action challenges.
//!
//! The machine asks for the four actions one at a time in random order, never
//! repeating one that is already done. After each completion it pauses for a
//! cooldown (nothing is detected) before arming the next challenge:
//!
//! ```text
//! Idle ──first frame──▶ Active(a) ──predicate──▶ Cooldown(next) ──elapsed──▶ Active(next)
//!                           │
//!                           └──last action──▶ AllComplete
//! ```
//!
//! The next action is drawn at the moment of completion, so a presentation
//! layer always has an action to show (with a "please wait" during cooldown).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::Thresholds;
use crate::types::{ActionKind, FeatureSet};

/// Where the machine is between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    /// No challenge picked yet.
    Idle,
    /// Waiting for the user to perform this action.
    Active(ActionKind),
    /// Post-completion pause; `next` becomes active once `until` has passed.
    Cooldown { until: Instant, next: ActionKind },
    /// Every action is done. Terminal.
    AllComplete,
}

/// A change of challenge caused by one frame, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    /// The challenge that was current before this frame.
    pub previous_action: Option<ActionKind>,
    /// The challenge this frame satisfied, if any.
    pub completed_action: Option<ActionKind>,
    /// The challenge that is current after this frame; `None` once all are done.
    pub new_action: Option<ActionKind>,
}

/// Snapshot of the challenge bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeState {
    pub remaining_actions: Vec<ActionKind>,
    pub current_action: Option<ActionKind>,
    pub last_transition: Option<Instant>,
}

/// Whether `features` satisfy `action` under `thresholds`.
///
/// Both head predicates compare the magnitude of the angle, so turning either
/// way counts. A degenerate eye or mouth contour never satisfies its action.
pub fn action_satisfied(action: ActionKind, features: &FeatureSet, thresholds: &Thresholds) -> bool {
    match action {
        ActionKind::Blink => !features.ear_degenerate && features.ear < thresholds.ear,
        ActionKind::OpenMouth => !features.mar_degenerate && features.mar > thresholds.mar,
        ActionKind::ShakeHead => features.yaw.abs() > thresholds.yaw_deg,
        ActionKind::Nod => features.pitch.abs() > thresholds.pitch_deg,
    }
}

pub struct ChallengeStateMachine {
    thresholds: Thresholds,
    cooldown: Duration,
    rng: StdRng,
    phase: ChallengePhase,
    remaining: Vec<ActionKind>,
    completed: Vec<ActionKind>,
    last_transition: Option<Instant>,
}

impl ChallengeStateMachine {
    /// Create a machine. With a seed the challenge order is reproducible.
    pub fn new(thresholds: Thresholds, cooldown: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            thresholds,
            cooldown,
            rng,
            phase: ChallengePhase::Idle,
            remaining: ActionKind::ALL.to_vec(),
            completed: Vec::with_capacity(ActionKind::ALL.len()),
            last_transition: None,
        }
    }

    /// Back to the initial configuration: all four actions outstanding.
    pub fn reset(&mut self) {
        self.phase = ChallengePhase::Idle;
        self.remaining = ActionKind::ALL.to_vec();
        self.completed.clear();
        self.last_transition = None;
    }

    pub fn phase(&self) -> ChallengePhase {
        self.phase
    }

    pub fn current_action(&self) -> Option<ActionKind> {
        match self.phase {
            ChallengePhase::Active(a) | ChallengePhase::Cooldown { next: a, .. } => Some(a),
            ChallengePhase::Idle | ChallengePhase::AllComplete => None,
        }
    }

    /// Completed actions in completion order.
    pub fn completed(&self) -> &[ActionKind] {
        &self.completed
    }

    pub fn remaining(&self) -> &[ActionKind] {
        &self.remaining
    }

    pub fn in_cooldown(&self) -> bool {
        matches!(self.phase, ChallengePhase::Cooldown { .. })
    }

    pub fn is_complete(&self) -> bool {
        self.phase == ChallengePhase::AllComplete
    }

    pub fn state(&self) -> ChallengeState {
        ChallengeState {
            remaining_actions: self.remaining.clone(),
            current_action: self.current_action(),
            last_transition: self.last_transition,
        }
    }

    /// Advance on one frame. A missing feature set is a no-op.
    pub fn evaluate(&mut self, features: Option<&FeatureSet>, now: Instant) -> Option<TransitionEvent> {
        self.step(features, now, true)
    }

    /// Like [`evaluate`](Self::evaluate), but with `allow_credit = false` the
    /// frame may select or arm a challenge without completing one.
    pub fn step(
        &mut self,
        features: Option<&FeatureSet>,
        now: Instant,
        allow_credit: bool,
    ) -> Option<TransitionEvent> {
        let features = features?;

        let mut selected = None;
        let action = match self.phase {
            ChallengePhase::AllComplete => return None,
            ChallengePhase::Cooldown { until, .. } if now < until => return None,
            ChallengePhase::Cooldown { next, .. } => {
                self.phase = ChallengePhase::Active(next);
                self.last_transition = Some(now);
                tracing::debug!(action = %next, "challenge armed");
                next
            }
            ChallengePhase::Idle => {
                let first = self.draw();
                self.phase = ChallengePhase::Active(first);
                self.last_transition = Some(now);
                selected = Some(first);
                tracing::debug!(action = %first, "first challenge selected");
                first
            }
            ChallengePhase::Active(a) => a,
        };

        if !(allow_credit && action_satisfied(action, features, &self.thresholds)) {
            return selected.map(|a| TransitionEvent {
                previous_action: None,
                completed_action: None,
                new_action: Some(a),
            });
        }

        self.completed.push(action);
        self.remaining.retain(|&a| a != action);
        self.last_transition = Some(now);

        let next = if self.remaining.is_empty() {
            self.phase = ChallengePhase::AllComplete;
            None
        } else {
            let next = self.draw();
            self.phase = ChallengePhase::Cooldown {
                until: now + self.cooldown,
                next,
            };
            Some(next)
        };

        tracing::info!(
            action = %action,
            completed = self.completed.len(),
            next = ?next,
            "challenge completed"
        );

        Some(TransitionEvent {
            previous_action: if selected.is_some() { None } else { Some(action) },
            completed_action: Some(action),
            new_action: next,
        })
    }

    /// Uniform pick from the outstanding actions. Callers guarantee at least
    /// one remains.
    fn draw(&mut self) -> ActionKind {
        let i = self.rng.gen_range(0..self.remaining.len());
        self.remaining[i]
    }
}

//! `liveness replay` and `liveness features`: run recorded traces through the
//! core without a camera.

use anyhow::{Context, Result};
use liveness_core::{
    ActionKind, FeatureExtractor, FeatureSet, LandmarkNormalizer, LivenessSession,
    SessionConfig, TransitionEvent,
};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::trace::{read_trace, TraceFrame};

/// A transition and the trace time it happened at.
#[derive(Debug, Clone, Serialize)]
pub struct TimedTransition {
    pub t_ms: u64,
    #[serde(flatten)]
    pub event: TransitionEvent,
}

/// Outcome of replaying a whole trace.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub session: String,
    pub frames: u64,
    pub skipped: u64,
    pub completed_actions: Vec<ActionKind>,
    pub is_complete: bool,
    /// Trace time of the frame that completed the last challenge.
    pub completed_at_ms: Option<u64>,
    pub transitions: Vec<TimedTransition>,
}

/// Feed every frame to a fresh session.
pub fn replay(frames: &[TraceFrame], config: SessionConfig) -> Result<ReplaySummary> {
    let mut session = LivenessSession::new(config).context("invalid session configuration")?;
    session.start();

    let base = Instant::now();
    let mut transitions = Vec::new();
    let mut completed_at_ms = None;

    for frame in frames {
        let points = frame
            .points()
            .with_context(|| format!("frame at {} ms", frame.t_ms))?;
        let result = session.on_frame(&points, frame.width, frame.height, frame.at(base));

        if let Some(event) = result.transition {
            if result.is_complete && completed_at_ms.is_none() {
                completed_at_ms = Some(frame.t_ms);
            }
            transitions.push(TimedTransition {
                t_ms: frame.t_ms,
                event,
            });
        }
    }

    session.stop();
    let last = session.result(None);

    Ok(ReplaySummary {
        session: session.id().to_string(),
        frames: last.frames_seen,
        skipped: last.frames_skipped,
        completed_actions: last.completed_actions,
        is_complete: last.is_complete,
        completed_at_ms,
        transitions,
    })
}

/// Features of one trace frame; `None` when it could not be used.
pub fn frame_features(frame: &TraceFrame, normalizer: &LandmarkNormalizer) -> Option<FeatureSet> {
    let points = frame.points().ok()?;
    let set = normalizer
        .try_normalize(&points, frame.width, frame.height)
        .ok()?;
    FeatureExtractor.extract(&set)
}

fn describe(action: Option<ActionKind>) -> &'static str {
    action.map(|a| a.key()).unwrap_or("-")
}

/// Run the replay command.
pub fn run(trace: &Path, config: SessionConfig) -> Result<()> {
    let frames = read_trace(trace)?;
    tracing::debug!(frames = frames.len(), trace = %trace.display(), "trace loaded");

    let summary = replay(&frames, config)?;

    for t in &summary.transitions {
        match t.event.completed_action {
            Some(done) => println!(
                "{:>8} ms  completed {:<11} next {}",
                t.t_ms,
                done.key(),
                describe(t.event.new_action)
            ),
            None => println!(
                "{:>8} ms  challenge {}",
                t.t_ms,
                describe(t.event.new_action)
            ),
        }
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[derive(Serialize)]
struct FeatureLine<'a> {
    t_ms: u64,
    features: &'a Option<FeatureSet>,
}

/// Run the features command: one JSON line per frame.
pub fn run_features(trace: &Path, config: &SessionConfig) -> Result<()> {
    let frames = read_trace(trace)?;
    let normalizer = LandmarkNormalizer::new(config.mirror(), config.require_iris);

    for frame in &frames {
        let features = frame_features(frame, &normalizer);
        let line = FeatureLine {
            t_ms: frame.t_ms,
            features: &features,
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

mod common;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use common::{started_session, SyntheticFace, FRAME, STEP};
use liveness_core::landmarks::{BASE_LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE};
use liveness_core::{
    ActionKind, FeatureExtractor, LandmarkNormalizer, LandmarkPoint, LivenessSession,
    SessionConfig, SessionResult,
};

fn feed(session: &mut LivenessSession, face: SyntheticFace, now: Instant) -> SessionResult {
    session.on_frame(&face.raw(), FRAME, FRAME, now)
}

/// Complete challenges until `target` is the armed action. Returns the time
/// of the last frame fed.
fn advance_until(session: &mut LivenessSession, target: ActionKind, mut now: Instant) -> Instant {
    feed(session, SyntheticFace::neutral(), now);
    loop {
        now += STEP;
        // Arms the pending action if cooling down.
        let r = feed(session, SyntheticFace::neutral(), now);
        let current = r.current_action.expect("challenge in progress");
        if current == target {
            return now;
        }
        now += STEP;
        feed(session, SyntheticFace::performing(current), now);
    }
}

#[test]
fn features_of_synthetic_face() {
    let normalizer = LandmarkNormalizer::new(false, true);
    let set = normalizer.normalize(&SyntheticFace::neutral().raw(), FRAME, FRAME);
    let f = FeatureExtractor.extract(&set).unwrap();
    assert!((f.ear - 0.3).abs() < 1e-9);
    assert!((f.mar - 0.1).abs() < 1e-9);
    assert!(f.yaw.abs() < 1e-9);
    assert!(f.pitch.abs() < 1e-9);
    assert!(f.roll.abs() < 1e-9);
}

#[test]
fn first_frame_selects_a_challenge() {
    let mut s = started_session(1);
    let r = feed(&mut s, SyntheticFace::neutral(), Instant::now());
    let ev = r.transition.expect("selection event");
    assert_eq!(ev.previous_action, None);
    assert_eq!(ev.completed_action, None);
    assert_eq!(ev.new_action, r.current_action);
    assert!(r.current_action.is_some());
    assert!(!r.is_complete);
}

#[test]
fn scenario_a_blink_completes_blink_challenge() {
    let mut s = started_session(11);
    let now = advance_until(&mut s, ActionKind::Blink, Instant::now());

    let r = feed(&mut s, SyntheticFace::performing(ActionKind::Blink), now + STEP);
    let f = r.features.unwrap();
    assert!((f.ear - 0.1).abs() < 1e-9);
    assert_eq!(r.transition.unwrap().completed_action, Some(ActionKind::Blink));
    assert!(r.completed_actions.contains(&ActionKind::Blink));
}

#[test]
fn scenario_b_open_mouth_completes_open_mouth_challenge() {
    let mut s = started_session(12);
    let now = advance_until(&mut s, ActionKind::OpenMouth, Instant::now());

    let r = feed(&mut s, SyntheticFace::performing(ActionKind::OpenMouth), now + STEP);
    let f = r.features.unwrap();
    assert!((f.mar - 0.75).abs() < 1e-9);
    assert_eq!(r.transition.unwrap().completed_action, Some(ActionKind::OpenMouth));
}

#[test]
fn scenario_c_collapsed_eyes_do_not_count_as_blink() {
    let mut s = started_session(13);
    let now = advance_until(&mut s, ActionKind::Blink, Instant::now());

    let mut raw = SyntheticFace::neutral().raw();
    let spot = raw[LEFT_EYE[0]];
    for &i in LEFT_EYE.iter().chain(RIGHT_EYE.iter()) {
        raw[i] = spot;
    }

    let r = s.on_frame(&raw, FRAME, FRAME, now + STEP);
    let f = r.features.unwrap();
    assert_eq!(f.ear, 0.0);
    assert!(f.ear_degenerate);
    assert_eq!(r.transition, None);
    assert!(!r.completed_actions.contains(&ActionKind::Blink));
    assert_eq!(r.current_action, Some(ActionKind::Blink));

    // A real blink still works afterwards.
    let r = feed(&mut s, SyntheticFace::performing(ActionKind::Blink), now + STEP * 2);
    assert!(r.completed_actions.contains(&ActionKind::Blink));
}

#[test]
fn scenario_d_full_session_completes() {
    let mut s = started_session(42);
    let mut now = Instant::now();
    let mut r = feed(&mut s, SyntheticFace::neutral(), now);

    let mut frames = 0;
    while let Some(action) = r.current_action {
        now += STEP;
        r = feed(&mut s, SyntheticFace::performing(action), now);
        assert_eq!(r.transition.unwrap().completed_action, Some(action));
        frames += 1;
        assert!(frames <= 4, "more than four completions");
    }

    assert!(r.is_complete);
    assert_eq!(r.completed_count(), 4);
    let unique: HashSet<_> = r.completed_actions.iter().collect();
    assert_eq!(unique.len(), 4);
    assert_eq!(r.transition.unwrap().new_action, None);

    // Terminal.
    let after = feed(&mut s, SyntheticFace::performing(ActionKind::Nod), now + STEP);
    assert_eq!(after.transition, None);
    assert_eq!(after.completed_count(), 4);
}

#[test]
fn other_actions_are_not_credited() {
    let mut s = started_session(5);
    let now = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), now);
    let current = r.current_action.unwrap();

    for action in ActionKind::ALL.into_iter().filter(|&a| a != current) {
        let r = feed(&mut s, SyntheticFace::performing(action), now);
        assert!(r.completed_actions.is_empty(), "{action} credited for {current}");
        assert_eq!(r.current_action, Some(current));
    }
}

#[test]
fn cooldown_suppresses_detection() {
    let mut s = started_session(6);
    let t0 = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), t0);
    let first = r.current_action.unwrap();

    let r = feed(&mut s, SyntheticFace::performing(first), t0);
    assert!(r.in_cooldown);
    let next = r.current_action.unwrap();
    assert_ne!(next, first);

    let r = feed(&mut s, SyntheticFace::performing(next), t0 + Duration::from_millis(1000));
    assert_eq!(r.completed_count(), 1);
    assert!(r.in_cooldown);

    let r = feed(&mut s, SyntheticFace::performing(next), t0 + Duration::from_millis(2500));
    assert_eq!(r.completed_count(), 2);
}

#[test]
fn unusable_frames_change_nothing() {
    let mut s = started_session(7);
    let now = Instant::now();
    let before = feed(&mut s, SyntheticFace::neutral(), now);

    let short: Vec<LandmarkPoint> = SyntheticFace::neutral().raw().into_iter().take(100).collect();
    let r1 = s.on_frame(&[], FRAME, FRAME, now);
    let r2 = s.on_frame(&short, FRAME, FRAME, now);
    let r3 = s.on_frame(&SyntheticFace::neutral().raw(), 0, 0, now);

    for r in [&r1, &r2, &r3] {
        assert_eq!(r.transition, None);
        assert_eq!(r.current_action, before.current_action);
        assert_eq!(r.completed_actions, before.completed_actions);
    }
    assert_eq!(r3.frames_skipped, 3);
    assert_eq!(r3.frames_seen, 4);
}

#[test]
fn stop_halts_frames_and_keeps_results() {
    let mut s = started_session(8);
    let now = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), now);
    let first = r.current_action.unwrap();
    let done = feed(&mut s, SyntheticFace::performing(first), now);

    s.stop();
    assert!(!s.is_accepting());

    let next = done.current_action.unwrap();
    let r = feed(&mut s, SyntheticFace::performing(next), now + STEP);
    assert_eq!(r.completed_actions, vec![first]);
    assert_eq!(r.frames_seen, done.frames_seen);
    assert_eq!(r.transition, None);
}

#[test]
fn restart_resets_challenges() {
    let mut s = started_session(9);
    let now = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), now);
    feed(&mut s, SyntheticFace::performing(r.current_action.unwrap()), now);

    s.start();
    let r = s.result(None);
    assert!(r.completed_actions.is_empty());
    assert_eq!(r.current_action, None);
    assert_eq!(r.frames_seen, 0);
    assert_eq!(s.challenge_state().remaining_actions.len(), 4);
}

#[test]
fn mirrored_feed_reads_same_head_turn() {
    let face = SyntheticFace::performing(ActionKind::ShakeHead);
    let plain = LandmarkNormalizer::new(false, true).normalize(&face.raw(), FRAME, FRAME);
    let mirrored = LandmarkNormalizer::new(true, true).normalize(&face.raw(), FRAME, FRAME);

    let a = FeatureExtractor.extract(&plain).unwrap();
    let b = FeatureExtractor.extract(&mirrored).unwrap();
    assert!(a.yaw.abs() > 30.0);
    assert!((a.yaw.abs() - b.yaw.abs()).abs() < 1e-9);
    assert!((a.pitch - b.pitch).abs() < 1e-9);
    assert!(b.roll.abs() < 1e-9);
}

#[test]
fn base_mesh_without_iris_is_evaluated() {
    let config = SessionConfig {
        require_iris: false,
        ..common::config(3)
    };
    let mut s = LivenessSession::new(config).unwrap();
    s.start();

    let raw: Vec<_> = SyntheticFace::neutral()
        .raw()
        .into_iter()
        .take(BASE_LANDMARK_COUNT)
        .collect();
    let r = s.on_frame(&raw, FRAME, FRAME, Instant::now());
    assert_eq!(r.frames_skipped, 0);
    assert!(r.current_action.is_some());
    let f = r.features.unwrap();
    assert!(f.yaw.abs() < 1e-9);
}

#[test]
fn iris_less_frame_rejected_when_iris_required() {
    let mut s = started_session(4);
    let raw: Vec<_> = SyntheticFace::neutral()
        .raw()
        .into_iter()
        .take(BASE_LANDMARK_COUNT)
        .collect();
    let r = s.on_frame(&raw, FRAME, FRAME, Instant::now());
    assert_eq!(r.frames_skipped, 1);
    assert_eq!(r.current_action, None);
}

#[test]
fn motion_gate_blocks_still_images() {
    let config = SessionConfig {
        min_eye_motion: Some(0.5),
        ..common::config(21)
    };
    let mut s = LivenessSession::new(config).unwrap();
    s.start();

    let mut now = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), now);
    let current = r.current_action.unwrap();
    for _ in 0..5 {
        now += Duration::from_millis(33);
        let r = feed(&mut s, SyntheticFace::performing(current), now);
        assert!(r.completed_actions.is_empty());
        assert!(r.eye_motion.unwrap() < 0.5);
    }
}

#[test]
fn motion_gate_passes_moving_eyes() {
    let config = SessionConfig {
        min_eye_motion: Some(0.5),
        ..common::config(21)
    };
    let mut s = LivenessSession::new(config).unwrap();
    s.start();

    let now = Instant::now();
    let r = feed(&mut s, SyntheticFace::neutral(), now);
    let current = r.current_action.unwrap();

    let mut face = SyntheticFace::performing(current);
    face.iris_offset = (2.0, 0.0);
    let r = feed(&mut s, face, now + Duration::from_millis(33));
    assert!(r.eye_motion.unwrap() >= 0.5);
    assert_eq!(r.completed_actions, vec![current]);
}

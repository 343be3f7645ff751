use super::*;

const TOTAL: f64 = 6.0;

fn render_t(outcome: TickOutcome) -> (f64, FrameRequest) {
    match outcome {
        TickOutcome::Render { t, next } => (t, next),
        other => panic!("expected a render, got {other:?}"),
    }
}

#[test]
fn play_tracks_wall_clock_from_the_start_position() {
    let mut s = PlaybackScheduler::new();
    let req = s.play(1.0, 100.0, TOTAL).unwrap();
    assert!(s.is_playing());

    let (t, req) = render_t(s.tick(req, 100.5, TOTAL));
    assert!((t - 1.5).abs() < 1e-9);
    let (t, _) = render_t(s.tick(req, 102.0, TOTAL));
    assert!((t - 3.0).abs() < 1e-9);
    assert!((s.position() - 3.0).abs() < 1e-9);
}

#[test]
fn reaching_the_end_stops_and_rewinds() {
    let mut s = PlaybackScheduler::new();
    let req = s.play(5.0, 0.0, TOTAL).unwrap();
    assert_eq!(s.tick(req, 1.0, TOTAL), TickOutcome::Finished);
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert_eq!(s.position(), 0.0);
    assert_eq!(s.tick(req, 1.1, TOTAL), TickOutcome::Cancelled);
}

#[test]
fn pause_cancels_pending_requests() {
    let mut s = PlaybackScheduler::new();
    let req = s.play(0.0, 0.0, TOTAL).unwrap();
    let (_, req) = render_t(s.tick(req, 2.0, TOTAL));
    assert!((s.pause() - 2.0).abs() < 1e-9);
    assert_eq!(s.tick(req, 2.1, TOTAL), TickOutcome::Cancelled);
    assert!((s.position() - 2.0).abs() < 1e-9);
}

#[test]
fn seek_clamps_and_restarts_when_playing() {
    let mut s = PlaybackScheduler::new();
    assert_eq!(s.seek(-3.0, 0.0, TOTAL), (0.0, None));
    assert_eq!(s.seek(99.0, 0.0, TOTAL), (TOTAL, None));
    assert!(!s.is_playing());

    let old = s.play(0.0, 10.0, TOTAL).unwrap();
    let (t, restarted) = s.seek(4.0, 11.0, TOTAL);
    assert_eq!(t, 4.0);
    let new = restarted.unwrap();
    assert_eq!(s.tick(old, 11.1, TOTAL), TickOutcome::Cancelled);
    let (t, _) = render_t(s.tick(new, 11.5, TOTAL));
    assert!((t - 4.5).abs() < 1e-9);
}

#[test]
fn empty_timelines_do_not_play() {
    let mut s = PlaybackScheduler::new();
    assert!(s.play(0.0, 0.0, 0.0).is_err());
    assert!(!s.is_playing());
}

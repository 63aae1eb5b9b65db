use super::fake::FakePipeline;
use super::*;
use crate::library::Track;

fn track(id: &str, seconds: f64) -> Track {
    Track::new(id, id.to_uppercase(), format!("{id}.mp3")).with_duration(seconds)
}

fn pipeline_for(tracks: &[Track]) -> FakePipeline {
    tracks.iter().fold(FakePipeline::new(), |p, t| {
        p.with_duration(&t.src, t.duration.unwrap_or(0.0))
    })
}

/// A unit with `t` bound and its metadata already processed.
fn ready_unit(bus: &PlaybackBus, t: Track) -> (PlaybackUnit<FakePipeline>, FakePipeline) {
    let fake = pipeline_for(std::slice::from_ref(&t));
    let mut unit = PlaybackUnit::new(fake.clone(), bus);
    unit.bind_source(t);
    unit.poll();
    (unit, fake)
}

fn playing_unit(bus: &PlaybackBus, t: Track) -> (PlaybackUnit<FakePipeline>, FakePipeline) {
    let (mut unit, fake) = ready_unit(bus, t);
    unit.play();
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Playing);
    (unit, fake)
}

#[test]
fn bind_moves_idle_to_ready_without_playing() {
    let bus = PlaybackBus::new();
    let t = track("t0", 10.0);
    let fake = pipeline_for(std::slice::from_ref(&t));
    let mut unit = PlaybackUnit::new(fake.clone(), &bus);

    unit.bind_source(t);
    assert_eq!(unit.state(), LifecycleState::Idle);
    assert_eq!(unit.session().duration, 10.0);
    assert!(!unit.session().duration_confirmed);

    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Ready);
    assert!(unit.session().duration_confirmed);
    assert_eq!(fake.state().play_requests, 0);
}

#[test]
fn seek_lands_on_clamped_ratio_of_duration() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = ready_unit(&bus, track("t0", 200.0));

    for (requested, expected) in [(0.25, 50.0), (1.0, 200.0), (-3.0, 0.0), (7.5, 200.0)] {
        assert!(unit.seek(requested));
        assert_eq!(unit.session().position, expected);
        assert_eq!(fake.state().seeks.last().copied(), Some(expected));
    }
}

#[test]
fn seek_without_duration_is_ignored() {
    let bus = PlaybackBus::new();
    let fake = FakePipeline::new();
    let mut unit = PlaybackUnit::new(fake.clone(), &bus);
    unit.bind_source(Track::new("x", "X", "x.mp3"));

    assert!(!unit.seek(0.5));
    assert_eq!(unit.session().position, 0.0);
    assert!(fake.state().seeks.is_empty());
    assert_eq!(unit.state(), LifecycleState::Idle);
}

#[test]
fn display_ratio_is_zero_until_duration_known_and_clamped_after() {
    let bus = PlaybackBus::new();
    let fake = FakePipeline::new();
    let mut unit = PlaybackUnit::new(fake.clone(), &bus);
    unit.bind_source(Track::new("x", "X", "x.mp3"));

    fake.push(PipelineEvent::PositionAdvanced(42.0));
    unit.poll();
    assert_eq!(unit.session().position, 42.0);
    assert_eq!(unit.display_ratio(), 0.0);

    fake.push(PipelineEvent::MetadataReady { duration: 20.0 });
    unit.poll();
    // Confirmed duration clamps the stale report.
    assert_eq!(unit.session().position, 20.0);
    assert_eq!(unit.display_ratio(), 1.0);

    fake.push(PipelineEvent::PositionAdvanced(5.0));
    unit.poll();
    assert_eq!(unit.display_ratio(), 0.25);
}

#[test]
fn overlay_owns_display_while_scrubbing() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = playing_unit(&bus, track("t0", 100.0));

    unit.apply_scrub(ScrubSignal::Provisional(0.3));
    assert!(unit.is_scrubbing());
    fake.push(PipelineEvent::PositionAdvanced(80.0));
    unit.poll();
    assert_eq!(unit.display_ratio(), 0.3);
    assert_eq!(unit.session().display_position(), 30.0);
    // The real position keeps tracking the pipeline underneath.
    assert_eq!(unit.session().position, 80.0);

    unit.apply_scrub(ScrubSignal::Committed(0.6));
    assert!(!unit.is_scrubbing());
    assert_eq!(unit.display_ratio(), 0.6);
    assert_eq!(fake.state().seeks, vec![60.0]);
}

#[test]
fn cancelled_scrub_falls_back_to_real_position() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = playing_unit(&bus, track("t0", 100.0));
    fake.push(PipelineEvent::PositionAdvanced(10.0));
    unit.poll();

    unit.apply_scrub(ScrubSignal::Provisional(0.9));
    unit.cancel_scrub();
    assert_eq!(unit.display_ratio(), 0.1);
    assert!(fake.state().seeks.is_empty());
}

#[test]
fn drag_sequence_seeks_once_on_release() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = playing_unit(&bus, track("t0", 50.0));
    let bar = BarBounds::new(0.0, 10.0);
    let mut gesture = ScrubGesture::new(NoCapture);

    unit.apply_scrub(gesture.press(bar, 3.0));
    assert_eq!(unit.display_ratio(), 0.3);
    fake.push(PipelineEvent::PositionAdvanced(1.0));
    unit.poll();
    assert_eq!(unit.display_ratio(), 0.3);

    let moved = gesture.drag_to(7.0).unwrap();
    unit.apply_scrub(moved);
    assert_eq!(unit.display_ratio(), 0.7);
    assert!(fake.state().seeks.is_empty());

    unit.apply_scrub(gesture.release(Some(7.0)).unwrap());
    assert_eq!(fake.state().seeks, vec![0.7 * 50.0]);
    assert_eq!(unit.display_ratio(), 0.7);
    assert!(!unit.is_scrubbing());
}

#[test]
fn double_play_before_confirmation_requests_once() {
    let bus = PlaybackBus::new();
    let observer = bus.subscribe(UnitId::next());
    let (mut unit, fake) = ready_unit(&bus, track("t0", 10.0));

    unit.play();
    unit.play();
    assert_eq!(fake.state().play_requests, 1);

    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Playing);
    assert_eq!(
        observer.drain(),
        vec![BusEvent::PlaybackStarted(unit.id())]
    );

    unit.play();
    unit.poll();
    assert_eq!(fake.state().play_requests, 1);
    assert!(observer.drain().is_empty());
}

#[test]
fn pause_is_idempotent_against_pipeline_state() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = playing_unit(&bus, track("t0", 10.0));

    unit.pause();
    unit.pause();
    assert_eq!(fake.state().pause_requests, 1);
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Paused);

    unit.toggle_play();
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Playing);
    unit.toggle_play();
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Paused);
    assert_eq!(fake.state().play_requests, 2);
}

#[test]
fn rejected_play_keeps_prior_state_and_surfaces_error() {
    let bus = PlaybackBus::new();
    let observer = bus.subscribe(UnitId::next());
    let (mut unit, fake) = ready_unit(&bus, track("t0", 10.0));

    fake.reject_next_play("device busy");
    unit.play();
    let signals = unit.poll();

    assert_eq!(unit.state(), LifecycleState::Ready);
    assert!(matches!(
        unit.last_error(),
        Some(PlaybackError::PlaybackRejected { reason }) if reason == "device busy"
    ));
    assert!(matches!(signals.as_slice(), [UnitSignal::Rejected(_)]));
    assert!(observer.drain().is_empty());

    // No automatic retry; a fresh request works and clears the error.
    assert_eq!(fake.state().play_requests, 1);
    unit.play();
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Playing);
    assert!(unit.last_error().is_none());
}

#[test]
fn other_unit_starting_pauses_this_one() {
    let bus = PlaybackBus::new();
    let (mut a, fake_a) = playing_unit(&bus, track("a", 10.0));
    let (mut b, _fake_b) = ready_unit(&bus, track("b", 10.0));

    b.play();
    b.poll();
    assert_eq!(b.state(), LifecycleState::Playing);

    // A's next turn sees the broadcast and pauses without re-broadcasting.
    a.poll();
    assert!(fake_a.state().paused);
    a.poll();
    assert_eq!(a.state(), LifecycleState::Paused);
    assert_eq!(b.state(), LifecycleState::Playing);
    b.poll();
    assert_eq!(b.state(), LifecycleState::Playing);
}

#[test]
fn toggling_a_preempted_unit_leaves_it_paused() {
    let bus = PlaybackBus::new();
    let (mut a, fake_a) = playing_unit(&bus, track("a", 10.0));
    let (mut b, _) = ready_unit(&bus, track("b", 10.0));
    b.play();
    b.poll();

    // A still looks audible; the user's toggle means pause.
    a.toggle_play();
    assert_eq!(fake_a.state().pause_requests, 1);
    assert_eq!(fake_a.state().play_requests, 1);
    assert!(fake_a.state().paused);

    a.poll();
    b.poll();
    assert_eq!(a.state(), LifecycleState::Paused);
    assert_eq!(b.state(), LifecycleState::Playing);
}

#[test]
fn start_overtaken_by_pause_is_not_broadcast() {
    let bus = PlaybackBus::new();
    let observer = bus.subscribe(UnitId::next());
    let (mut other, other_fake) = playing_unit(&bus, track("o", 10.0));
    observer.drain();
    let (mut unit, fake) = ready_unit(&bus, track("t0", 10.0));

    unit.play();
    unit.pause();
    assert!(unit.poll().is_empty());

    assert!(fake.state().paused);
    assert_ne!(unit.state(), LifecycleState::Playing);
    assert!(observer.drain().is_empty());

    other.poll();
    assert_eq!(other.state(), LifecycleState::Playing);
    assert!(!other_fake.state().paused);
}

#[test]
fn own_broadcast_does_not_pause_self() {
    let bus = PlaybackBus::new();
    let (mut a, fake) = playing_unit(&bus, track("a", 10.0));
    a.poll();
    assert_eq!(a.state(), LifecycleState::Playing);
    assert_eq!(fake.state().pause_requests, 0);
}

#[test]
fn dropping_a_unit_unsubscribes_it() {
    let bus = PlaybackBus::new();
    let (a, _) = ready_unit(&bus, track("a", 10.0));
    let (b, _) = ready_unit(&bus, track("b", 10.0));
    assert_eq!(bus.subscriber_count(), 2);
    drop(a);
    assert_eq!(bus.subscriber_count(), 1);
    drop(b);
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn ended_without_owner_rewinds_to_ready() {
    let bus = PlaybackBus::new();
    let (mut unit, fake) = playing_unit(&bus, track("t0", 10.0));
    fake.push(PipelineEvent::PositionAdvanced(10.0));
    fake.finish();

    let signals = unit.poll();
    assert_eq!(signals, vec![UnitSignal::Rewound]);
    assert_eq!(unit.state(), LifecycleState::Ready);
    assert_eq!(unit.session().position, 0.0);
    assert_eq!(fake.state().seeks, vec![0.0]);
}

#[test]
fn play_while_idle_waits_for_metadata() {
    let bus = PlaybackBus::new();
    let fake = FakePipeline::new();
    let mut unit = PlaybackUnit::new(fake.clone(), &bus);
    unit.play();
    assert_eq!(fake.state().play_requests, 0);

    unit.bind_source(Track::new("x", "X", "x.mp3"));
    unit.play();
    assert_eq!(fake.state().play_requests, 0);

    fake.push(PipelineEvent::MetadataReady { duration: 3.0 });
    unit.poll();
    assert_eq!(fake.state().play_requests, 1);
    unit.poll();
    assert_eq!(unit.state(), LifecycleState::Playing);
}

// --- transport ---------------------------------------------------------

fn transport(tracks: Vec<Track>) -> (PlaylistTransport<FakePipeline>, FakePipeline) {
    let bus = PlaybackBus::new();
    transport_on(&bus, tracks)
}

fn transport_on(
    bus: &PlaybackBus,
    tracks: Vec<Track>,
) -> (PlaylistTransport<FakePipeline>, FakePipeline) {
    let fake = pipeline_for(&tracks);
    let unit = PlaybackUnit::new(fake.clone(), bus);
    (PlaylistTransport::new(unit, tracks), fake)
}

/// Poll until the pipeline has nothing more to say.
fn settle(t: &mut PlaylistTransport<FakePipeline>) {
    for _ in 0..8 {
        t.poll();
    }
}

#[test]
fn initial_load_cues_first_track_without_playing() {
    let (mut t, fake) = transport(vec![track("t0", 10.0), track("t1", 20.0)]);
    assert_eq!(t.active(), Some(0));
    settle(&mut t);
    assert_eq!(t.unit().state(), LifecycleState::Ready);
    assert_eq!(fake.state().play_requests, 0);
    assert_eq!(fake.state().bound, vec!["t0.mp3".to_string()]);
}

#[test]
fn next_and_prev_wrap_around() {
    let tracks: Vec<Track> = (0..4).map(|i| track(&format!("t{i}"), 5.0)).collect();
    let (mut t, _) = transport(tracks);
    let n = 4;

    for i in 0..n {
        t.load_at(i, false);
        assert_eq!(t.next(), Navigation::Loaded((i + 1) % n));
        t.load_at(i, false);
        assert_eq!(t.prev(), Navigation::Loaded((i + n - 1) % n));
    }
}

#[test]
fn single_track_next_and_prev_stay_put() {
    let (mut t, fake) = transport(vec![track("only", 5.0)]);
    assert_eq!(t.next(), Navigation::Loaded(0));
    assert_eq!(t.prev(), Navigation::Loaded(0));
    assert_eq!(fake.state().bound.len(), 3);
}

#[test]
fn out_of_range_and_empty_navigation_is_ignored() {
    let (mut t, fake) = transport(vec![track("t0", 5.0)]);
    assert_eq!(t.load_at(1, true), Navigation::Ignored);
    assert_eq!(t.active(), Some(0));
    assert_eq!(fake.state().bound.len(), 1);

    let (mut empty, fake) = transport(Vec::new());
    assert_eq!(empty.active(), None);
    assert_eq!(empty.next(), Navigation::Ignored);
    assert_eq!(empty.prev(), Navigation::Ignored);
    assert_eq!(empty.load_at(0, false), Navigation::Ignored);
    assert!(fake.state().bound.is_empty());
    assert_eq!(empty.unit().state(), LifecycleState::Idle);
}

#[test]
fn set_tracks_resets_to_first_track() {
    let (mut t, _) = transport(vec![track("t0", 5.0), track("t1", 5.0)]);
    t.load_at(1, false);
    t.set_tracks(vec![track("n0", 7.0), track("n1", 8.0), track("n2", 9.0)]);
    assert_eq!(t.active(), Some(0));
    assert_eq!(t.active_track().map(|x| x.id.as_str()), Some("n0"));
}

#[test]
fn ended_track_advances_and_autoplays_next() {
    let (mut t, fake) = transport(vec![track("t0", 10.0), track("t1", 20.0)]);
    settle(&mut t);

    t.toggle_play();
    settle(&mut t);
    assert_eq!(t.unit().state(), LifecycleState::Playing);

    fake.push(PipelineEvent::PositionAdvanced(10.0));
    fake.finish();
    settle(&mut t);

    assert_eq!(t.active(), Some(1));
    assert_eq!(t.unit().state(), LifecycleState::Playing);
    assert_eq!(t.unit().session().position, 0.0);
    assert_eq!(t.unit().session().duration, 20.0);
}

#[test]
fn single_track_playlist_restarts_on_end() {
    let (mut t, fake) = transport(vec![track("t0", 5.0)]);
    settle(&mut t);
    t.toggle_play();
    settle(&mut t);

    fake.finish();
    settle(&mut t);

    assert_eq!(t.active(), Some(0));
    assert_eq!(t.unit().state(), LifecycleState::Playing);
    assert_eq!(fake.state().bound, vec!["t0.mp3".to_string(); 2]);
    assert_eq!(fake.state().play_requests, 2);
}

#[test]
fn two_listings_never_play_together() {
    let bus = PlaybackBus::new();
    let (mut left, _) = transport_on(&bus, vec![track("l0", 10.0)]);
    let (mut right, _) = transport_on(&bus, vec![track("r0", 10.0)]);
    settle(&mut left);
    settle(&mut right);

    left.toggle_play();
    settle(&mut left);
    right.toggle_play();
    settle(&mut right);
    settle(&mut left);

    assert_eq!(left.unit().state(), LifecycleState::Paused);
    assert_eq!(right.unit().state(), LifecycleState::Playing);
}

use std::time::Duration;

use proptest::prelude::*;

use super::mock::{Call, MockBackend, SharedLog, emit_latest, emit_on, tracks};
use super::*;

fn engine(n: usize, auto_confirm: bool) -> (PlaybackEngine<MockBackend>, SharedLog) {
    let (backend, log) = MockBackend::new(auto_confirm);
    (PlaybackEngine::new(backend, tracks(n), 1.0), log)
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn load_and_play_waits_for_confirmation_before_playing() {
    let (mut engine, log) = engine(3, false);

    engine.load_and_play(1).unwrap();
    assert_eq!(engine.session().current_index, Some(1));
    assert_eq!(engine.session().state, TransportState::Loading);
    assert!(!engine.session().playing());
    assert_eq!(log.borrow().calls.last(), Some(&Call::Play("/Music/song-1.mp3".into())));

    emit_latest(&log, MediaEventKind::Playing);
    assert_eq!(engine.pump(), 1);
    assert!(engine.session().playing());
    assert_eq!(engine.session().current_index, Some(1));
    assert_eq!(engine.current_track().map(|t| t.name.as_str()), Some("Song 1"));
}

#[test]
fn load_and_play_rejects_out_of_range_index_without_touching_state() {
    let (mut engine, log) = engine(2, true);

    let err = engine.load_and_play(2).unwrap_err();
    assert!(matches!(err, PlaybackError::IndexOutOfRange { index: 2, len: 2 }));
    assert_eq!(engine.session().current_index, None);
    assert_eq!(engine.session().state, TransportState::Idle);
    assert!(log.borrow().binds.is_empty());
}

#[test]
fn refused_start_is_recorded_as_paused_state() {
    let (mut backend, log) = MockBackend::new(true);
    backend.refuse_play.insert("/Music/song-0.mp3".to_string());
    let mut engine = PlaybackEngine::new(backend, tracks(2), 1.0);

    assert!(engine.load_and_play(0).is_err());
    engine.pump();

    let s = engine.session();
    assert_eq!(s.current_index, Some(0));
    assert_eq!(s.state, TransportState::Paused);
    assert!(!s.playing());
    assert!(s.last_error.as_deref().unwrap().contains("autoplay blocked"));
    assert_eq!(log.borrow().binds.len(), 1);
}

#[test]
fn unbindable_track_stays_selected_and_paused() {
    let (mut backend, _log) = MockBackend::new(true);
    backend.unbindable.insert("/Music/song-1.mp3".to_string());
    let mut engine = PlaybackEngine::new(backend, tracks(3), 1.0);

    assert!(engine.load_and_play(1).is_err());
    assert_eq!(engine.session().current_index, Some(1));
    assert_eq!(engine.session().state, TransportState::Paused);

    // Resuming retries the bind and fails the same way, still without panicking.
    assert!(engine.resume().is_err());
    assert_eq!(engine.session().state, TransportState::Paused);

    // Moving on still works.
    engine.next_track().unwrap();
    engine.pump();
    assert_eq!(engine.session().current_index, Some(2));
    assert!(engine.session().playing());
    assert_eq!(engine.session().last_error, None);
}

#[test]
fn toggle_is_a_no_op_with_nothing_selected() {
    let (mut engine, log) = engine(3, true);
    engine.toggle_play_pause().unwrap();
    engine.pump();
    assert_eq!(engine.session().state, TransportState::Idle);
    assert!(log.borrow().calls.is_empty());
}

#[test]
fn toggle_pauses_and_resumes_through_resource_events() {
    let (mut engine, log) = engine(3, false);
    engine.load_and_play(0).unwrap();
    emit_latest(&log, MediaEventKind::Playing);
    engine.pump();

    engine.toggle_play_pause().unwrap();
    assert_eq!(log.borrow().calls.last(), Some(&Call::Pause("/Music/song-0.mp3".into())));
    // Not confirmed yet.
    assert!(engine.session().playing());

    emit_latest(&log, MediaEventKind::Paused);
    engine.pump();
    assert_eq!(engine.session().state, TransportState::Paused);

    engine.toggle_play_pause().unwrap();
    assert_eq!(log.borrow().calls.last(), Some(&Call::Play("/Music/song-0.mp3".into())));
    emit_latest(&log, MediaEventKind::Playing);
    engine.pump();
    assert!(engine.session().playing());
}

#[test]
fn next_and_previous_wrap_around() {
    let (mut engine, _log) = engine(3, true);

    engine.load_and_play(0).unwrap();
    engine.previous_track().unwrap();
    assert_eq!(engine.session().current_index, Some(2));

    engine.next_track().unwrap();
    assert_eq!(engine.session().current_index, Some(0));

    engine.load_and_play(2).unwrap();
    engine.next_track().unwrap();
    assert_eq!(engine.session().current_index, Some(0));
}

#[test]
fn next_and_previous_do_nothing_when_idle() {
    let (mut engine, log) = engine(3, true);
    engine.next_track().unwrap();
    engine.previous_track().unwrap();
    assert_eq!(engine.session().current_index, None);
    assert!(log.borrow().binds.is_empty());

    let (mut empty, _log) = engine_with_no_tracks();
    empty.next_track().unwrap();
    assert_eq!(empty.session().current_index, None);
}

fn engine_with_no_tracks() -> (PlaybackEngine<MockBackend>, SharedLog) {
    engine(0, true)
}

#[test]
fn ended_events_loop_the_playlist_forever() {
    let (mut engine, log) = engine(3, true);
    engine.load_and_play(1).unwrap();
    engine.pump();

    let mut seen = Vec::new();
    for _ in 0..6 {
        emit_latest(&log, MediaEventKind::Ended);
        engine.pump();
        seen.push(engine.session().current_index.unwrap());
        assert!(engine.session().playing());
    }
    assert_eq!(seen, vec![2, 0, 1, 2, 0, 1]);
}

#[test]
fn switching_tracks_stops_the_previous_resource() {
    let (mut engine, log) = engine(3, true);
    engine.load_and_play(0).unwrap();
    engine.load_and_play(1).unwrap();
    assert!(log.borrow().calls.contains(&Call::Stop("/Music/song-0.mp3".into())));
}

#[test]
fn stale_events_from_an_abandoned_resource_are_ignored() {
    let (mut engine, log) = engine(3, false);

    engine.load_and_play(0).unwrap();
    let first = engine.generation();
    engine.load_and_play(1).unwrap();
    assert_ne!(engine.generation(), first);

    // The first resource finishes loading late.
    emit_on(&log, 0, MediaEventKind::DurationKnown(secs(999)));
    emit_on(&log, 0, MediaEventKind::Playing);
    emit_on(&log, 0, MediaEventKind::Ended);
    assert_eq!(engine.pump(), 0);

    let s = engine.session();
    assert_eq!(s.current_index, Some(1));
    assert_eq!(s.duration, None);
    assert_eq!(s.state, TransportState::Loading);

    emit_on(&log, 1, MediaEventKind::DurationKnown(secs(120)));
    emit_on(&log, 0, MediaEventKind::DurationKnown(secs(999)));
    engine.pump();
    assert_eq!(engine.session().duration, Some(secs(120)));
}

#[test]
fn seek_to_maps_fraction_onto_duration() {
    let (mut engine, log) = engine(1, true);
    engine.load_and_play(0).unwrap();
    emit_latest(&log, MediaEventKind::DurationKnown(secs(200)));
    engine.pump();

    engine.seek_to(0.5).unwrap();
    engine.pump();
    assert_eq!(
        log.borrow().calls.last(),
        Some(&Call::Seek("/Music/song-0.mp3".into(), secs(100)))
    );
    assert_eq!(engine.session().position, secs(100));
    assert_eq!(engine.session().progress(), Some(0.5));
}

#[test]
fn seek_to_clamps_out_of_range_fractions_and_ignores_nan() {
    let (mut engine, log) = engine(1, true);
    engine.load_and_play(0).unwrap();
    emit_latest(&log, MediaEventKind::DurationKnown(secs(200)));
    engine.pump();

    engine.seek_to(1.7).unwrap();
    engine.pump();
    assert_eq!(engine.session().position, secs(200));

    engine.seek_to(-0.3).unwrap();
    engine.pump();
    assert_eq!(engine.session().position, Duration::ZERO);

    let calls_before = log.borrow().calls.len();
    engine.seek_to(f64::NAN).unwrap();
    assert_eq!(log.borrow().calls.len(), calls_before);
}

#[test]
fn seek_is_a_no_op_until_duration_is_known() {
    let (mut engine, log) = engine(1, true);
    engine.seek_to(0.5).unwrap();

    engine.load_and_play(0).unwrap();
    engine.pump();
    engine.seek_to(0.5).unwrap();
    emit_latest(&log, MediaEventKind::DurationKnown(Duration::ZERO));
    engine.pump();
    engine.seek_to(0.5).unwrap();

    assert!(!log.borrow().calls.iter().any(|c| matches!(c, Call::Seek(..))));
}

#[test]
fn seek_by_fraction_moves_relative_to_position() {
    let (mut engine, log) = engine(1, true);
    engine.load_and_play(0).unwrap();
    emit_latest(&log, MediaEventKind::DurationKnown(secs(200)));
    emit_latest(&log, MediaEventKind::TimeUpdate(secs(50)));
    engine.pump();

    engine.seek_by_fraction(0.25).unwrap();
    engine.pump();
    assert_eq!(engine.session().position, secs(100));
}

#[test]
fn time_updates_never_exceed_duration() {
    let (mut engine, log) = engine(1, false);
    engine.load_and_play(0).unwrap();
    emit_latest(&log, MediaEventKind::DurationKnown(secs(60)));
    emit_latest(&log, MediaEventKind::TimeUpdate(secs(75)));
    engine.pump();
    assert_eq!(engine.session().position, secs(60));
}

#[test]
fn set_volume_clamps_and_reaches_new_resources() {
    let (mut engine, log) = engine(2, true);

    engine.set_volume(1.5);
    assert_eq!(engine.session().volume, 1.0);
    engine.set_volume(-0.2);
    assert_eq!(engine.session().volume, 0.0);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.session().volume, 0.0);

    engine.set_volume(0.4);
    engine.load_and_play(0).unwrap();
    assert!(log.borrow().calls.contains(&Call::Volume("/Music/song-0.mp3".into(), 0.4)));

    engine.set_volume(0.7);
    assert_eq!(log.borrow().calls.last(), Some(&Call::Volume("/Music/song-0.mp3".into(), 0.7)));
}

#[test]
fn failed_event_pauses_and_records_reason() {
    let (mut engine, log) = engine(2, true);
    engine.load_and_play(0).unwrap();
    engine.pump();
    emit_latest(&log, MediaEventKind::Failed("device unplugged".into()));
    engine.pump();
    assert_eq!(engine.session().state, TransportState::Paused);
    assert_eq!(engine.session().last_error.as_deref(), Some("device unplugged"));
}

#[test]
fn shutdown_returns_to_idle_and_silences_the_last_resource() {
    let (mut engine, log) = engine(2, true);
    engine.load_and_play(0).unwrap();
    engine.pump();
    engine.shutdown();
    assert_eq!(engine.session().state, TransportState::Idle);
    assert_eq!(engine.session().current_index, None);

    emit_on(&log, 0, MediaEventKind::Playing);
    assert_eq!(engine.pump(), 0);
    assert_eq!(engine.session().state, TransportState::Idle);
}

proptest! {
    #[test]
    fn n_nexts_land_on_start_plus_n_mod_len(len in 1usize..20, start in 0usize..20, steps in 0usize..60) {
        let start = start % len;
        let (mut engine, _log) = engine(len, true);
        engine.load_and_play(start).unwrap();
        for _ in 0..steps {
            engine.next_track().unwrap();
        }
        prop_assert_eq!(engine.session().current_index, Some((start + steps) % len));
    }

    #[test]
    fn n_previouses_land_on_start_minus_n_mod_len(len in 1usize..20, start in 0usize..20, steps in 0usize..60) {
        let start = start % len;
        let (mut engine, _log) = engine(len, true);
        engine.load_and_play(start).unwrap();
        for _ in 0..steps {
            engine.previous_track().unwrap();
        }
        let expected = (start + len * steps - steps) % len;
        prop_assert_eq!(engine.session().current_index, Some(expected));
    }

    #[test]
    fn volume_always_within_unit_range(v in -10.0f32..10.0) {
        let (mut engine, _log) = engine(1, true);
        engine.set_volume(v);
        let vol = engine.session().volume;
        prop_assert!((0.0..=1.0).contains(&vol));
    }

    #[test]
    fn seek_never_leaves_track_bounds(fraction in -5.0f64..5.0, total in 1u64..3600) {
        let (mut engine, log) = engine(1, true);
        engine.load_and_play(0).unwrap();
        emit_latest(&log, MediaEventKind::DurationKnown(secs(total)));
        engine.pump();
        engine.seek_to(fraction).unwrap();
        engine.pump();
        prop_assert!(engine.session().position <= secs(total));
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{RecordingBackend, Trigger, Voice};
use super::*;
use crate::parser::parse;

fn scheduler_with(source: &str) -> Scheduler<RecordingBackend> {
    let mut scheduler = Scheduler::new(RecordingBackend::new()).with_seed(1);
    scheduler.set_program(Rc::new(parse(source).unwrap()));
    scheduler
}

fn times(triggers: &[Trigger]) -> Vec<f64> {
    triggers.iter().map(|t| t.time).collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
    }
}

#[test]
fn stopped_scheduler_plays_nothing() {
    let mut s = scheduler_with("event(kick, 36, 1, T).");
    assert_eq!(s.tick_at(0.0), 0);
    assert!(s.backend().triggers.is_empty());
}

#[test]
fn start_initialises_the_backend() {
    let mut s = scheduler_with("event(kick, 36, 1, T).");
    s.start();
    assert!(s.is_running());
    assert_eq!(s.backend().inits, 1);
}

#[test]
fn each_grid_point_plays_once() {
    // 120 bpm, quarter-beat grid: one point every 0.125 s, 80 ms lookahead.
    let mut s = scheduler_with("event(kick, 36, 1, T).");
    s.start();
    assert_eq!(s.tick_at(0.0), 1);
    assert_eq!(s.tick_at(0.0), 0);
    assert_eq!(s.tick_at(0.05), 1);
    assert_eq!(s.tick_at(0.06), 0);
    assert_eq!(s.tick_at(0.2), 1);
    assert_close(&times(&s.backend_mut().take()), &[0.0, 0.125, 0.25]);
}

#[test]
fn late_tick_skips_to_the_current_point() {
    let mut s = scheduler_with("event(kick, 36, 1, T).");
    s.start();
    s.tick_at(0.0);
    s.tick_at(1.0);
    assert_close(&times(&s.backend_mut().take()), &[0.0, 1.0]);
}

#[test]
fn tick_reads_the_backend_clock() {
    let mut s = scheduler_with("event(kick, 36, 1, T).");
    s.start();
    s.backend_mut().set_time(0.5);
    assert_eq!(s.tick(), 1);
    assert_close(&times(&s.backend().triggers), &[0.5]);
}

#[test]
fn solutions_map_to_voices() {
    let mut s = scheduler_with(
        "event(kick, P, V, T).
         event(sine, 60, 0.5, T).
         event(banana, 1, 1, T).
         event(X, 1, 1, T).
         event(7, 1, 1, T).",
    );
    s.start();
    s.tick_at(0.0);
    let played = s.backend_mut().take();
    assert_eq!(
        played,
        vec![
            Trigger::drum(Voice::Kick, 0.0, DEFAULT_VELOCITY),
            Trigger::melodic(Voice::Sine, 0.0, 60.0, 0.5),
        ]
    );
}

#[test]
fn pitch_and_velocity_are_evaluated_and_clamped() {
    let mut s = scheduler_with("event(hat, 1, 3, T). event(square, 60 + 7, 0 - 1, T).");
    s.start();
    s.tick_at(0.0);
    let played = s.backend_mut().take();
    assert_eq!(played[0].velocity, 1.0);
    assert_eq!(played[1].pitch, Some(67.0));
    assert_eq!(played[1].velocity, 0.0);
}

#[test]
fn missing_pitch_defaults_for_melodic_voices() {
    let mut s = scheduler_with("event(triangle, foo, 0.2, T).");
    s.start();
    s.tick_at(0.0);
    assert_eq!(s.backend().triggers[0].pitch, Some(DEFAULT_PITCH));
}

#[test]
fn chords_fan_out_into_several_triggers() {
    let mut s = scheduler_with("event(sine, N, 0.6, T) :- every(T, 1), chord(60, maj, 0, N).");
    s.start();
    assert_eq!(s.tick_at(0.0), 3);
    let pitches: Vec<Option<f64>> = s.backend().triggers.iter().map(|t| t.pitch).collect();
    assert_eq!(pitches, vec![Some(60.0), Some(64.0), Some(67.0)]);
}

#[test]
fn swing_delays_odd_eighths() {
    assert_eq!(swing_adjust(0.0, 120.0, 0.5), 0.0);
    assert_eq!(swing_adjust(0.25, 120.0, 0.5), 0.375);
    assert_eq!(swing_adjust(0.5, 120.0, 0.5), 0.5);

    let mut s = scheduler_with("event(hat, 48, 1, T) :- every(T, 0.5).");
    s.configure(120.0, 0.5, 0.0, 0.0);
    s.start();
    for now in [0.0, 0.1, 0.2, 0.3, 0.45] {
        s.tick_at(now);
    }
    assert_close(&times(&s.backend().triggers), &[0.0, 0.375, 0.5]);
}

#[test]
fn configure_keeps_values_it_cannot_use() {
    let mut s = Scheduler::new(RecordingBackend::new());
    s.configure(-1.0, 2.0, 0.0, -1.0);
    assert_eq!(s.bpm(), DEFAULT_BPM);
    assert_eq!(s.swing(), 1.0);
    assert_eq!(s.lookahead_ms(), DEFAULT_LOOKAHEAD_MS);
    assert_eq!(s.grid_beats(), DEFAULT_GRID_BEATS);
    s.configure(90.0, 0.25, 120.0, 0.5);
    assert_eq!((s.bpm(), s.swing(), s.lookahead_ms(), s.grid_beats()), (90.0, 0.25, 120.0, 0.5));
}

#[test]
fn beat_callbacks_fire_on_crossings_and_on_stop() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut s = Scheduler::new(RecordingBackend::new());
    let handle = {
        let seen = Rc::clone(&seen);
        s.add_beat_callback(Box::new(move |beat: i64| seen.borrow_mut().push(beat)))
    };
    assert_eq!(handle, 1);
    s.start();
    for now in [0.0, 0.3, 0.5, 0.6, 1.0] {
        s.tick_at(now);
    }
    s.stop();
    assert_eq!(*seen.borrow(), vec![1, 2, 0]);
    assert_eq!(s.current_beat(), 0);

    assert!(s.remove_beat_callback(handle));
    s.start();
    s.tick_at(3.0);
    s.stop();
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn stop_forgets_cycles_and_the_dispatch_cursor() {
    let mut s = scheduler_with("event(V, 60, 1, T) :- cycle([kick, snare], V).");
    s.start();
    s.tick_at(0.0);
    s.tick_at(0.05);
    s.stop();
    assert_eq!(s.state().cycle_count(), 0);
    s.start();
    s.tick_at(0.0);
    let voices: Vec<Voice> = s.backend().triggers.iter().map(|t| t.voice).collect();
    assert_eq!(voices, vec![Voice::Kick, Voice::Snare, Voice::Kick]);
}

#[test]
fn ticking_without_a_program_is_silent() {
    let mut s = Scheduler::new(RecordingBackend::new());
    s.start();
    assert_eq!(s.tick_at(0.5), 0);
    assert_eq!(s.current_beat(), 1);
}

#[test]
fn voice_names_parse() {
    assert_eq!("kick".parse::<Voice>(), Ok(Voice::Kick));
    assert!("banana".parse::<Voice>().is_err());
    assert!(Voice::Triangle.is_melodic());
    assert!(!Voice::Noise.is_melodic());
}

//! Allocation-free tick path tests.
//!
//! These tests verify that `Session::update()` does not allocate once a
//! session is running. Dense charts with chords, holds and breakpoints are
//! played for tens of seconds to catch allocations on rarely taken paths.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use hl_chart::{Chart, NoteEvent, SongMeta};
use hl_engine::{AudioClip, PlayConfig, Session, SessionPhase, SimulatedTransport};
use hl_master::{autoplay_inputs, InputFeeder};

const DT: f64 = 1.0 / 60.0;

fn dense_chart(seconds: usize, with_breakpoints: bool) -> Chart {
    let mut notes = Vec::new();
    for beat in 0..seconds * 4 {
        let t = 1.0 + beat as f64 * 0.25;
        let lane = (beat % 4) as u8;
        if beat % 8 == 0 {
            notes.push(NoteEvent::hold(lane, t, 0.4));
        } else {
            notes.push(NoteEvent::tap(lane, t));
        }
        if beat % 6 == 0 {
            notes.push(NoteEvent::tap((lane + 2) % 4, t));
        }
        if with_breakpoints && beat % 40 == 39 {
            notes.push(NoteEvent::breakpoint(lane, t + 0.1));
        }
    }
    Chart::new(SongMeta::new("dense"), 4, notes)
}

fn roomy_config() -> PlayConfig {
    PlayConfig { note_pool_size: 128, effect_pool_size: 128, ..PlayConfig::default() }
}

/// Play `chart` for `frames`, aborting on any heap allocation after start.
fn assert_play_alloc_free(chart: &Chart, miss_every: usize, frames: usize) {
    let config = roomy_config();
    let clip = AudioClip::new(chart.duration() + 1.0);
    let mut session = Session::new(config.clone(), SimulatedTransport::new(clip.duration));
    session.start(Some(chart), Some(clip), 0).unwrap();
    session.update(DT);
    assert_eq!(session.phase(), SessionPhase::Running);

    let mut feeder = InputFeeder::new(autoplay_inputs(chart, miss_every), &config);
    assert_no_alloc(|| {
        for _ in 0..frames {
            if session.phase() == SessionPhase::Paused {
                session.resume();
            }
            feeder.feed(&mut session, DT);
            session.update(DT);
            for _ in session.drain_events() {}
        }
    });
    assert!(session.score().successful_hits() > 0);
}

#[test]
fn perfect_play_alloc_free() {
    assert_play_alloc_free(&dense_chart(20, false), 0, 60 * 25);
}

#[test]
fn sloppy_play_alloc_free() {
    assert_play_alloc_free(&dense_chart(20, false), 3, 60 * 25);
}

#[test]
fn breakpoints_alloc_free() {
    assert_play_alloc_free(&dense_chart(20, true), 0, 60 * 30);
}

#[test]
fn finish_alloc_free() {
    let chart = dense_chart(2, false);
    assert_play_alloc_free(&chart, 0, 60 * 10);
}

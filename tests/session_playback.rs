//! End-to-end: record a take, store the chart, load it back and play it.

use hl_master::{Controller, MemorySettings, PlayConfig, RecorderConfig, SongMeta};
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn recorded(name: &str) -> hl_master::Chart {
    let text = fs::read_to_string(fixtures_dir().join(name)).unwrap();
    let inputs = hl_formats::parse_input_log(&text).unwrap();
    hl_formats::record(&inputs, RecorderConfig::default(), SongMeta::new(name))
}

fn controller_with(name: &str) -> Controller<MemorySettings> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("take.hlc");
    hl_formats::save_chart_file(&path, &recorded(name)).unwrap();

    let mut ctrl: Controller<MemorySettings> = Controller::default();
    ctrl.load_chart_file(&path).unwrap();
    ctrl
}

#[test]
fn recorded_take_autoplays_clean() {
    let ctrl = controller_with("mixed.log");
    let outcome = ctrl.autoplay(0).unwrap();
    assert_eq!(outcome.report.total_notes, 7);
    assert_eq!(outcome.report.successful_hits, 7);
    assert_eq!(outcome.report.achievement_rate, 100.0);
    assert!(outcome.report.full_combo);
    assert_eq!(outcome.tally.miss, 0);
    assert_eq!(outcome.tally.holds_completed, 2);
    // Five taps, two hold heads and two hold completions, all at 100.
    assert_eq!(outcome.report.score, 900);
    assert!(outcome.report.max_combo >= 7);
}

#[test]
fn skipped_notes_cost_the_full_combo() {
    let ctrl = controller_with("mixed.log");
    let outcome = ctrl.autoplay(3).unwrap();
    assert_eq!(outcome.tally.miss, 2);
    assert_eq!(outcome.report.successful_hits, 5);
    assert_eq!(outcome.tally.holds_completed, 1);
    assert!(!outcome.report.full_combo);
    assert!(outcome.report.achievement_rate < 100.0);
}

#[test]
fn offset_shifts_audio_not_judgment() {
    let ctrl = controller_with("calibration.log");
    let early = ctrl.autoplay_with_offset(0, 0).unwrap();
    let late = ctrl.autoplay_with_offset(0, 600).unwrap();
    assert_eq!(early.report, late.report);
    assert_eq!(early.report.achievement_rate, 100.0);
}

#[test]
fn slow_notes_grow_the_pool_only_as_needed() {
    let mut ctrl = Controller::new(
        PlayConfig { note_pool_size: 2, ..PlayConfig::default() },
        MemorySettings::new(),
    );
    ctrl.set_chart(recorded("calibration.log"));
    let outcome = ctrl.autoplay(0).unwrap();
    assert_eq!(outcome.report.achievement_rate, 100.0);
    assert!(outcome.note_pool_capacity > 2);
    assert!(outcome.note_pool_capacity <= 8);
}

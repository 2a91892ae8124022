//! Calibration against a recorded calibration chart with on-disk settings.

use hl_engine::LaneInput;
use hl_master::{
    CalibrationLoop, CalibrationOutcome, Controller, JsonSettings, MemorySettings, PlayConfig,
    RecorderConfig, SettingsStore, SongMeta, DEFAULT_AUDIO_OFFSET_FRAMES,
};
use std::fs;
use std::path::PathBuf;

fn take() -> Vec<LaneInput> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/calibration.log");
    hl_formats::parse_input_log(&fs::read_to_string(path).unwrap()).unwrap()
}

fn late(inputs: &[LaneInput], by: f64) -> Vec<LaneInput> {
    inputs.iter().map(|i| LaneInput { timestamp: i.timestamp + by, ..*i }).collect()
}

#[test]
fn failed_run_persists_nothing_then_retry_commits() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");

    let chart = hl_formats::record(&take(), RecorderConfig::default(), SongMeta::new("Calibration").calibration());
    let mut ctrl = Controller::new(PlayConfig::default(), JsonSettings::open(&settings_path).unwrap());
    ctrl.set_chart(chart);
    let mut cal = CalibrationLoop::new(ctrl.settings());

    // Half a second late misses every note.
    cal.decrease();
    let (outcome, run) = ctrl.calibrate(&mut cal, late(&take(), 0.5)).unwrap();
    assert!(matches!(outcome, CalibrationOutcome::Failed { .. }));
    assert_eq!(run.report.successful_hits, 0);
    assert!(!settings_path.exists());

    cal.decrease();
    let (outcome, run) = ctrl.calibrate(&mut cal, take()).unwrap();
    assert_eq!(outcome, CalibrationOutcome::Success { offset_frames: DEFAULT_AUDIO_OFFSET_FRAMES - 2 });
    assert_eq!(run.report.achievement_rate, 100.0);

    let reopened = JsonSettings::open(&settings_path).unwrap();
    assert_eq!(reopened.audio_offset_frames(), DEFAULT_AUDIO_OFFSET_FRAMES - 2);
    assert!(reopened.is_calibrated());
}

#[test]
fn slightly_late_take_still_passes() {
    let chart = hl_formats::record(&take(), RecorderConfig::default(), SongMeta::new("Calibration").calibration());
    let mut ctrl: Controller<MemorySettings> = Controller::default();
    ctrl.set_chart(chart);
    let mut cal = CalibrationLoop::new(ctrl.settings());
    // 0.3s is 3 travel units: Good, not a miss.
    let (outcome, run) = ctrl.calibrate(&mut cal, late(&take(), 0.3)).unwrap();
    assert!(matches!(outcome, CalibrationOutcome::Success { .. }));
    assert_eq!(run.report.score, 8 * 50);
    assert_eq!(ctrl.settings().save_count(), 1);
}

//! Recorder: lane press/release timestamps to a quantized chart.
//!
//! A press opens a provisional tap at `press_time - offset_seconds`. The
//! matching release measures the true duration on un-offset times and turns
//! the note into a hold when the duration reaches the hold threshold. When
//! recording stops, notes are sorted and grouped into chords.

use hl_chart::{Chart, NoteEvent, NoteKind, SongMeta, DEFAULT_LANE_COUNT};
use hl_engine::LaneInput;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Recorder tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecorderConfig {
    pub lane_count: u8,
    /// Input latency subtracted from every press time.
    pub offset_seconds: f64,
    /// Shortest press that becomes a hold note (inclusive).
    pub hold_threshold: f64,
    /// Notes closer than this to a chord's first note join the chord.
    pub quantization_threshold: f64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            offset_seconds: 0.0,
            hold_threshold: 0.2,
            quantization_threshold: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    WaitingForPlay,
    Recording,
    Stopped,
}

#[derive(Clone, Copy, Debug)]
struct OpenNote {
    press_time: f64,
}

/// Collects lane events during a take.
pub struct Recorder {
    config: RecorderConfig,
    state: RecorderState,
    open: Vec<Option<OpenNote>>,
    notes: Vec<NoteEvent>,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            open: vec![None; config.lane_count as usize],
            config,
            state: RecorderState::WaitingForPlay,
            notes: Vec::new(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Begin a take, discarding anything recorded before.
    pub fn start(&mut self) {
        self.notes.clear();
        self.open.iter_mut().for_each(|slot| *slot = None);
        self.state = RecorderState::Recording;
    }

    /// Notes finalized so far (unsorted, unquantized).
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn press(&mut self, lane: u8, time: f64) {
        if self.state != RecorderState::Recording {
            return;
        }
        let Some(slot) = self.open.get_mut(lane as usize) else {
            warn!("press on lane {} ignored, only {} lanes", lane, self.config.lane_count);
            return;
        };
        if let Some(previous) = slot.replace(OpenNote { press_time: time }) {
            debug!("lane {} pressed again before release, keeping earlier press as a tap", lane);
            let hit_time = self.offset(previous.press_time);
            self.notes.push(NoteEvent::tap(lane, hit_time));
        }
    }

    pub fn release(&mut self, lane: u8, time: f64) {
        if self.state != RecorderState::Recording {
            return;
        }
        let Some(open) = self.open.get_mut(lane as usize).and_then(Option::take) else {
            return;
        };
        let hit_time = self.offset(open.press_time);
        let duration = time - open.press_time;
        let note = if duration >= self.config.hold_threshold {
            NoteEvent::hold(lane, hit_time, duration)
        } else {
            NoteEvent::tap(lane, hit_time)
        };
        self.notes.push(note);
    }

    /// Forward one lane event.
    pub fn input(&mut self, input: LaneInput) {
        if input.pressed {
            self.press(input.lane, input.timestamp);
        } else {
            self.release(input.lane, input.timestamp);
        }
    }

    /// End the take and build the chart. Notes still held become taps.
    pub fn stop(&mut self, meta: SongMeta) -> Chart {
        for lane in 0..self.open.len() {
            if let Some(open) = self.open[lane].take() {
                let hit_time = self.offset(open.press_time);
                self.notes.push(NoteEvent::tap(lane as u8, hit_time));
            }
        }
        self.state = RecorderState::Stopped;

        let mut notes = core::mem::take(&mut self.notes);
        notes.sort_by(|a, b| a.hit_time.total_cmp(&b.hit_time));
        quantize_chords(&mut notes, self.config.quantization_threshold);
        Chart::new(meta, self.config.lane_count, notes)
    }

    fn offset(&self, press_time: f64) -> f64 {
        (press_time - self.config.offset_seconds).max(0.0)
    }
}

/// Snap near-simultaneous notes to a common time.
///
/// `notes` must be sorted by hit time. Each chord is anchored at its first
/// note; later notes strictly within `threshold` of the anchor take the
/// anchor's time, and hold members of a hold-anchored chord take its
/// duration. Membership is measured against the anchor only, so dense
/// notes do not chain past the threshold.
pub fn quantize_chords(notes: &mut [NoteEvent], threshold: f64) {
    let mut i = 0;
    while i < notes.len() {
        let anchor = notes[i];
        let mut j = i + 1;
        while j < notes.len() && notes[j].hit_time - anchor.hit_time < threshold {
            notes[j].hit_time = anchor.hit_time;
            if anchor.kind == NoteKind::Hold && notes[j].kind == NoteKind::Hold {
                notes[j].hold_duration = anchor.hold_duration;
            }
            j += 1;
        }
        i = j;
    }
}

/// Record a complete take from sorted lane events.
pub fn record(inputs: &[LaneInput], config: RecorderConfig, meta: SongMeta) -> Chart {
    let mut recorder = Recorder::new(config);
    recorder.start();
    for input in inputs {
        recorder.input(*input);
    }
    recorder.stop(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn take(inputs: &[LaneInput]) -> Chart {
        record(inputs, RecorderConfig::default(), SongMeta::new("take"))
    }

    #[test]
    fn chord_snaps_to_first_press() {
        let chart = take(&[
            LaneInput::press(0, 0.00),
            LaneInput::press(1, 0.02),
            LaneInput::press(2, 0.04),
            LaneInput::release(0, 0.1),
            LaneInput::release(1, 0.1),
            LaneInput::release(2, 0.1),
        ]);
        let times: Vec<f64> = chart.notes().iter().map(|n| n.hit_time).collect();
        assert_eq!(times, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn chords_do_not_chain() {
        // 0.00-0.04 and 0.04-0.08 are each within threshold; 0.00-0.08 is not.
        let chart = take(&[
            LaneInput::press(0, 0.00),
            LaneInput::press(1, 0.04),
            LaneInput::press(2, 0.08),
        ]);
        let times: Vec<f64> = chart.notes().iter().map(|n| n.hit_time).collect();
        assert_eq!(times, [0.0, 0.0, 0.08]);
    }

    #[test]
    fn hold_threshold_is_inclusive() {
        let chart = take(&[
            LaneInput::press(0, 1.0),
            LaneInput::release(0, 1.25),
            LaneInput::press(1, 2.0),
            LaneInput::release(1, 2.0 + 0.2 - 1e-9),
        ]);
        assert_eq!(chart.notes()[0].kind, NoteKind::Hold);
        assert_eq!(chart.notes()[0].hold_duration, 0.25);
        assert_eq!(chart.notes()[1].kind, NoteKind::Tap);
        assert_eq!(chart.notes()[1].hold_duration, 0.0);
    }

    #[test]
    fn exact_threshold_is_hold() {
        let config = RecorderConfig { hold_threshold: 0.5, ..Default::default() };
        let chart = record(
            &[LaneInput::press(0, 1.0), LaneInput::release(0, 1.5)],
            config,
            SongMeta::default(),
        );
        assert_eq!(chart.notes()[0].kind, NoteKind::Hold);
    }

    #[test]
    fn offset_moves_hit_time_not_duration() {
        let config = RecorderConfig { offset_seconds: 0.1, ..Default::default() };
        let chart = record(
            &[LaneInput::press(0, 1.0), LaneInput::release(0, 1.5)],
            config,
            SongMeta::default(),
        );
        let note = chart.notes()[0];
        assert!((note.hit_time - 0.9).abs() < 1e-12);
        assert_eq!(note.hold_duration, 0.5);
    }

    #[test]
    fn offset_never_goes_negative() {
        let config = RecorderConfig { offset_seconds: 0.3, ..Default::default() };
        let chart = record(&[LaneInput::press(0, 0.1)], config, SongMeta::default());
        assert_eq!(chart.notes()[0].hit_time, 0.0);
    }

    #[test]
    fn open_notes_become_taps() {
        let chart = take(&[LaneInput::press(3, 2.0)]);
        assert_eq!(chart.notes(), [NoteEvent::tap(3, 2.0)]);
    }

    #[test]
    fn open_notes_at_stop_take_offset() {
        let config = RecorderConfig { offset_seconds: 0.5, ..Default::default() };
        let chart = record(
            &[LaneInput::press(0, 0.2), LaneInput::press(1, 2.0)],
            config,
            SongMeta::default(),
        );
        assert_eq!(chart.notes(), [NoteEvent::tap(0, 0.0), NoteEvent::tap(1, 1.5)]);
    }

    #[test]
    fn repress_keeps_earlier_note() {
        let chart = take(&[
            LaneInput::press(0, 1.0),
            LaneInput::press(0, 2.0),
            LaneInput::release(0, 2.5),
        ]);
        assert_eq!(chart.notes(), [NoteEvent::tap(0, 1.0), NoteEvent::hold(0, 2.0, 0.5)]);
    }

    #[test]
    fn hold_members_take_anchor_duration() {
        let chart = take(&[
            LaneInput::press(0, 1.00),
            LaneInput::press(1, 1.03),
            LaneInput::release(0, 1.50),
            LaneInput::release(1, 1.60),
        ]);
        for note in chart.notes() {
            assert_eq!(note.hit_time, 1.0);
            assert_eq!(note.hold_duration, 0.5);
        }
    }

    #[test]
    fn tap_anchor_leaves_hold_duration() {
        let chart = take(&[
            LaneInput::press(0, 1.00),
            LaneInput::release(0, 1.05),
            LaneInput::press(1, 1.03),
            LaneInput::release(1, 1.60),
        ]);
        let hold = chart.notes().iter().find(|n| n.kind == NoteKind::Hold).unwrap();
        assert_eq!(hold.hit_time, 1.0);
        assert!((hold.hold_duration - 0.57).abs() < 1e-9);
    }

    #[test]
    fn ignores_input_outside_recording() {
        let mut rec = Recorder::new(RecorderConfig::default());
        rec.press(0, 1.0);
        assert_eq!(rec.state(), RecorderState::WaitingForPlay);
        rec.start();
        rec.press(9, 1.0);
        rec.press(0, 1.0);
        let chart = rec.stop(SongMeta::default());
        assert_eq!(chart.len(), 1);
        rec.press(0, 3.0);
        assert_eq!(rec.note_count(), 0);
    }

    proptest! {
        #[test]
        fn recorded_charts_are_sorted_and_valid(
            events in prop::collection::vec((0u8..4, 0.0f64..30.0, 0.0f64..1.0), 0..80),
        ) {
            let mut inputs = Vec::new();
            for (lane, t, hold) in events {
                inputs.push(LaneInput::press(lane, t));
                inputs.push(LaneInput::release(lane, t + hold));
            }
            inputs.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
            let chart = take(&inputs);

            for pair in chart.notes().windows(2) {
                prop_assert!(pair[0].hit_time <= pair[1].hit_time);
            }
            prop_assert!(chart.validate().is_ok());
        }
    }
}

//! Scripted play-through of a chart.
//!
//! [`autoplay_inputs`] turns a chart into the lane events of a player who
//! hits every note dead on, optionally skipping some. [`InputFeeder`] hands
//! them to a session one frame at a time; [`run_offline`] drives a whole
//! session on a simulated transport as fast as it can.

use hl_chart::{Chart, NoteKind};
use hl_engine::{
    audio_delay, AudioClip, AudioTransport, Judgment, LaneInput, PlayConfig, ScheduleError, Session,
    SessionEvent, SessionPhase, SessionReport, SimulatedTransport,
};
use log::{debug, warn};

/// How long a tap is held down.
pub const TAP_HOLD_SECONDS: f64 = 0.03;

/// Lane events that hit every judged note, skipping every `miss_every`-th one.
///
/// `miss_every == 0` skips nothing. Events are sorted by time, releases
/// before presses on ties.
pub fn autoplay_inputs(chart: &Chart, miss_every: usize) -> Vec<LaneInput> {
    let notes = chart.notes();
    let mut inputs = Vec::with_capacity(notes.len() * 2);
    let judged = notes.iter().enumerate().filter(|(_, n)| n.is_judged());

    for (played, (index, note)) in judged.enumerate() {
        if miss_every > 0 && (played + 1) % miss_every == 0 {
            continue;
        }
        let release = match note.kind {
            NoteKind::Hold => note.end_time(),
            _ => {
                let next_on_lane = notes[index + 1..]
                    .iter()
                    .find(|n| n.lane == note.lane && n.is_judged())
                    .map_or(f64::INFINITY, |n| n.hit_time);
                (note.hit_time + TAP_HOLD_SECONDS).min(next_on_lane)
            }
        };
        inputs.push(LaneInput::press(note.lane, note.hit_time));
        inputs.push(LaneInput::release(note.lane, release));
    }
    inputs.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then(a.pressed.cmp(&b.pressed)));
    inputs
}

/// Feeds scripted inputs to a session, one frame ahead of its clock.
///
/// Inputs a breakpoint cuts off stay queued in the session and are played
/// after it resumes, so the feeder only ever moves forward.
#[derive(Clone, Debug)]
pub struct InputFeeder {
    inputs: Vec<LaneInput>,
    cursor: usize,
    sync_offset: f64,
}

impl InputFeeder {
    /// `inputs` are in chart time; they are shifted onto the notes clock.
    pub fn new(inputs: Vec<LaneInput>, config: &PlayConfig) -> Self {
        Self { inputs, cursor: 0, sync_offset: config.sync_offset }
    }

    /// Push every input due before the end of the next `dt` frame.
    pub fn feed<T: AudioTransport>(&mut self, session: &mut Session<T>, dt: f64) {
        if session.phase() != SessionPhase::Running {
            return;
        }
        let frame_end = session.song_position() + dt;
        while let Some(input) = self.inputs.get(self.cursor) {
            if input.timestamp > frame_end {
                break;
            }
            session.push_input(LaneInput { timestamp: input.timestamp - self.sync_offset, ..*input });
            self.cursor += 1;
        }
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len() - self.cursor
    }
}

/// Judgment counts gathered from session events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JudgmentTally {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub holds_completed: u32,
    pub holds_broken: u32,
    pub breakpoints: u32,
}

impl JudgmentTally {
    pub fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Judgment { judgment: Judgment::Perfect, .. } => self.perfect += 1,
            SessionEvent::Judgment { judgment: Judgment::Good, .. } => self.good += 1,
            SessionEvent::Judgment { judgment: Judgment::Miss, .. } => self.miss += 1,
            SessionEvent::HoldCompleted { .. } => self.holds_completed += 1,
            SessionEvent::HoldBroken { .. } => self.holds_broken += 1,
            SessionEvent::BreakpointReached { .. } => self.breakpoints += 1,
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoplayOutcome {
    pub report: SessionReport,
    pub tally: JudgmentTally,
    /// Notes-clock time when the session finished.
    pub elapsed: f64,
    /// Largest the note pool grew to.
    pub note_pool_capacity: usize,
}

/// Upper bound on simulated frames for a chart whose audio starts `delay` in.
fn frame_budget(chart: &Chart, config: &PlayConfig, delay: f64) -> usize {
    let seconds = chart.duration()
        + delay
        + config.end_buffer_seconds
        + config.audio_load_timeout
        + 10.0;
    (seconds * config.timeline_fps.max(1.0)) as usize
}

/// Length of the clip that matches `chart` when audio starts `delay` into the notes clock.
pub fn clip_for_chart(chart: &Chart, delay: f64) -> AudioClip {
    AudioClip::new((chart.duration() - delay).max(0.0) + 1.0)
}

/// Play `chart` to the end on a simulated transport, resuming after breakpoints.
pub fn run_offline(
    chart: &Chart,
    config: &PlayConfig,
    offset_frames: i32,
    inputs: Vec<LaneInput>,
) -> Result<AutoplayOutcome, ScheduleError> {
    let delay = audio_delay(config.countdown_seconds, offset_frames, config.timeline_fps);
    let clip = clip_for_chart(chart, delay);
    let dt = 1.0 / config.timeline_fps.max(1.0);

    let mut session = Session::new(config.clone(), SimulatedTransport::new(clip.duration));
    session.start(Some(chart), Some(clip), offset_frames)?;

    let mut feeder = InputFeeder::new(inputs, config);
    let mut tally = JudgmentTally::default();
    let budget = frame_budget(chart, config, delay);

    for _ in 0..budget {
        match session.phase() {
            SessionPhase::Finished | SessionPhase::Idle => break,
            SessionPhase::Paused => session.resume(),
            _ => {}
        }
        feeder.feed(&mut session, dt);
        session.update(dt);
        for event in session.drain_events() {
            if let SessionEvent::StartFailed(err) = event {
                return Err(err);
            }
            tally.record(&event);
        }
    }

    let report = match session.report() {
        Some(report) => report,
        None => {
            warn!("autoplay stopped after {} frames without finishing", budget);
            session.score().report()
        }
    };
    debug!("autoplay done, {} inputs unused", feeder.remaining());
    Ok(AutoplayOutcome {
        report,
        tally,
        elapsed: session.song_position(),
        note_pool_capacity: session.note_pool_capacity(),
    })
}

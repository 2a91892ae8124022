//! Session: the per-frame entry point.
//!
//! A host calls [`Session::update`] once per rendered frame, pushing lane
//! input beforehand and draining events afterwards. All waits (clip load,
//! end-of-song buffer) are conditions re-checked on each update.

use heapless::Deque;
use hl_chart::{Chart, NoteKind};
use log::{debug, info, warn};

use crate::clock::{AudioClip, AudioTransport};
use crate::config::PlayConfig;
use crate::effects::{EffectRuntime, EffectView};
use crate::events::{EventBuffer, SessionEvent};
use crate::judgment::JudgmentEngine;
use crate::notes::{NoteRuntime, NoteView};
use crate::scheduler::{PlaybackScheduler, ScheduleError, StartPoll};
use crate::score::{ScoreState, SessionReport};

/// Inputs buffered between two updates.
pub const INPUT_CAPACITY: usize = 64;

/// One lane press or release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneInput {
    pub lane: u8,
    pub pressed: bool,
    /// Notes-clock time of the event.
    pub timestamp: f64,
}

impl LaneInput {
    pub fn press(lane: u8, timestamp: f64) -> Self {
        Self { lane, pressed: true, timestamp }
    }

    pub fn release(lane: u8, timestamp: f64) -> Self {
        Self { lane, pressed: false, timestamp }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing loaded, or aborted.
    Idle,
    /// Waiting for the audio clip to load.
    WaitingForAudio,
    Running,
    Paused,
    Finished,
    /// The clip never loaded.
    Failed,
}

/// One song attempt, from scheduling to the final report.
pub struct Session<T: AudioTransport> {
    config: PlayConfig,
    transport: T,
    scheduler: PlaybackScheduler,
    notes: NoteRuntime,
    effects: EffectRuntime,
    judge: JudgmentEngine,
    events: EventBuffer,
    inputs: Deque<LaneInput, INPUT_CAPACITY>,
    phase: SessionPhase,
    notes_clock: f64,
    report: Option<SessionReport>,
}

impl<T: AudioTransport> Session<T> {
    pub fn new(config: PlayConfig, transport: T) -> Self {
        Self {
            scheduler: PlaybackScheduler::new(config.audio_load_timeout, config.end_buffer_seconds),
            notes: NoteRuntime::new(&config),
            effects: EffectRuntime::new(&config),
            judge: JudgmentEngine::new(&config),
            events: EventBuffer::new(),
            inputs: Deque::new(),
            phase: SessionPhase::Idle,
            notes_clock: 0.0,
            report: None,
            config,
            transport,
        }
    }

    /// Begin an attempt. The session waits for the clip on subsequent updates.
    ///
    /// Any attempt in progress is aborted first. Missing assets leave the
    /// session idle.
    pub fn start(
        &mut self,
        chart: Option<&Chart>,
        clip: Option<AudioClip>,
        offset_frames: i32,
    ) -> Result<(), ScheduleError> {
        self.reset();
        let delay = self.scheduler.begin(
            chart,
            clip,
            offset_frames,
            self.config.countdown_seconds,
            self.config.timeline_fps,
        )?;
        let Some(chart) = chart else {
            return Err(ScheduleError::MissingChart);
        };
        self.notes.load(chart.notes());
        let lanes = self.config.lane_count;
        let playable = chart
            .notes()
            .iter()
            .filter(|n| n.is_judged() && n.lane < lanes)
            .count();
        if playable < chart.total_note_count() {
            warn!(
                "{} notes beyond lane {} will not be judged",
                chart.total_note_count() - playable,
                lanes.saturating_sub(1)
            );
        }
        self.judge.reset(playable as u32);
        self.phase = SessionPhase::WaitingForAudio;
        info!(
            "session start: \"{}\", {} notes, audio delay {:.3}s",
            chart.meta.title,
            playable,
            delay
        );
        Ok(())
    }

    /// Queue a lane event for the next update.
    ///
    /// Events pushed while waiting for audio or paused are applied once the
    /// session runs again, at the notes-clock time it resumed from.
    pub fn push_input(&mut self, input: LaneInput) {
        if self.inputs.push_back(input).is_err() {
            warn!("input buffer full, dropping lane {} event", input.lane);
        }
    }

    /// Advance the session by one frame of `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.tick(dt));
        #[cfg(not(feature = "alloc_check"))]
        self.tick(dt);
    }

    fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        self.transport.advance(dt);

        match self.phase {
            SessionPhase::WaitingForAudio => match self.scheduler.poll_start(dt, &mut self.transport) {
                StartPoll::Waiting => {}
                StartPoll::Started { start_dsp, audio_delay } => {
                    self.phase = SessionPhase::Running;
                    self.notes_clock = 0.0;
                    self.events.push(SessionEvent::AudioScheduled { start_dsp, audio_delay });
                    self.advance_to(0.0);
                }
                StartPoll::TimedOut(err) => {
                    self.phase = SessionPhase::Failed;
                    self.events.push(SessionEvent::StartFailed(err));
                }
            },
            SessionPhase::Running => self.run(dt),
            // Held until the notes clock runs again, so no press or release is lost.
            SessionPhase::Paused => {}
            SessionPhase::Idle | SessionPhase::Finished | SessionPhase::Failed => self.inputs.clear(),
        }
    }

    fn run(&mut self, dt: f64) {
        let end = self.notes_clock + dt;

        while let Some(&input) = self.inputs.front() {
            let at = input.timestamp.max(self.notes_clock).min(end);
            if !self.advance_to(at) {
                // The rest of the queue is handled after resume.
                return;
            }
            self.inputs.pop_front();
            let position = self.song_position();
            if input.pressed {
                self.judge
                    .press(input.lane, position, &mut self.notes, &mut self.effects, &mut self.events);
            } else {
                self.judge.release(input.lane);
            }
        }

        if !self.advance_to(end) {
            return;
        }
        self.notes.retire_passed(self.song_position(), &mut self.events);
        self.effects.advance(dt);

        if self.scheduler.poll_end(dt, &self.transport) {
            self.finish();
        }
    }

    /// Move the notes clock to `time`: spawn, judge, then stop at breakpoints.
    /// Returns false if a breakpoint paused the session.
    fn advance_to(&mut self, time: f64) -> bool {
        self.notes_clock = time;
        let position = self.song_position();
        self.notes.spawn_due(position, &mut self.events);
        self.judge
            .sweep(position, &mut self.notes, &mut self.effects, &mut self.events);

        let speed = self.notes.note_speed();
        let reached = self
            .notes
            .earliest(|n| n.kind == NoteKind::Breakpoint && n.position(position, speed) <= 0.0);
        match reached {
            Some((id, note)) => {
                self.notes.retire(id, &mut self.events);
                self.events.push(SessionEvent::BreakpointReached { lane: note.lane, time: note.hit_time });
                debug!("breakpoint at {:.3}s", note.hit_time);
                self.pause();
                false
            }
            None => true,
        }
    }

    fn finish(&mut self) {
        let report = self.judge.score().report();
        self.phase = SessionPhase::Finished;
        self.report = Some(report);
        self.transport.stop();
        self.events.push(SessionEvent::SongFinished(report));
        info!(
            "session finished: score {}, max combo {}, {:.1}%",
            report.score, report.max_combo, report.achievement_rate
        );
    }

    /// Suspend the notes clock and the audio together.
    pub fn pause(&mut self) {
        if self.phase == SessionPhase::Running {
            self.transport.pause();
            self.phase = SessionPhase::Paused;
            self.events.push(SessionEvent::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.phase == SessionPhase::Paused {
            self.transport.resume();
            self.phase = SessionPhase::Running;
            self.events.push(SessionEvent::Resumed);
        }
    }

    /// Stop everything and return all notes and effects to their pools.
    pub fn abort(&mut self) {
        let was_active = self.phase != SessionPhase::Idle;
        self.reset();
        if was_active {
            self.events.push(SessionEvent::Aborted);
        }
    }

    fn reset(&mut self) {
        self.transport.stop();
        self.scheduler.reset();
        self.notes.clear();
        self.effects.clear();
        self.judge.reset(0);
        self.inputs.clear();
        self.notes_clock = 0.0;
        self.report = None;
        self.phase = SessionPhase::Idle;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Notes-clock time plus the platform sync offset.
    pub fn song_position(&self) -> f64 {
        self.notes_clock + self.config.sync_offset
    }

    pub fn score(&self) -> &ScoreState {
        self.judge.score()
    }

    /// Final report, once the song has finished.
    pub fn report(&self) -> Option<SessionReport> {
        self.report
    }

    pub fn is_lane_pressed(&self, lane: u8) -> bool {
        self.judge.lane(lane).is_some_and(|l| l.is_pressed())
    }

    pub fn note_views(&self) -> impl Iterator<Item = NoteView> + '_ {
        self.notes.views(self.song_position())
    }

    pub fn effect_views(&self) -> impl Iterator<Item = EffectView> + '_ {
        self.effects.views()
    }

    /// Pop buffered events in the order they happened.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        core::iter::from_fn(move || self.events.pop())
    }

    pub fn active_notes(&self) -> usize {
        self.notes.active_count()
    }

    pub fn note_pool_capacity(&self) -> usize {
        self.notes.pool_capacity()
    }

    pub fn active_effects(&self) -> usize {
        self.effects.active_count()
    }

    pub fn audio_delay(&self) -> f64 {
        self.scheduler.audio_delay()
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

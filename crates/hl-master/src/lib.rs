//! Headless controller for hitline.
//!
//! Owns the loaded chart, play configuration and settings store, and offers
//! offline autoplay, calibration and realtime playback that the CLI (or any
//! other front end) can share.

mod autoplay;
mod calibration;
mod realtime;
mod settings;

use core::fmt;
use std::path::Path;
use std::sync::atomic::Ordering;

use log::warn;
use realtime::PlaybackHandle;

// Re-export common types so callers don't need the lower crates directly.
pub use hl_audio::AudioError;
pub use hl_chart::{analyze, Chart, ChartStats, NoteEvent, NoteKind, SongMeta};
pub use hl_engine::{LaneInput, PlayConfig, ScheduleError, SessionReport};
pub use hl_formats::{FormatError, RecorderConfig};

pub use autoplay::{
    autoplay_inputs, clip_for_chart, run_offline, AutoplayOutcome, InputFeeder, JudgmentTally,
    TAP_HOLD_SECONDS,
};
pub use calibration::{CalibrationLoop, CalibrationOutcome, DEFAULT_STEP_FRAMES};
pub use settings::{
    load_play_config, JsonSettings, MemorySettings, SettingsError, SettingsStore, AUDIO_OFFSET_KEY,
    CALIBRATED_KEY, DEFAULT_AUDIO_OFFSET_FRAMES,
};

#[derive(Debug)]
pub enum PlayError {
    /// No chart has been loaded
    NoChart,
    Schedule(ScheduleError),
    Audio(AudioError),
    Settings(SettingsError),
    /// The realtime playback thread panicked
    ThreadPanicked,
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::NoChart => write!(f, "no chart loaded"),
            PlayError::Schedule(err) => write!(f, "{}", err),
            PlayError::Audio(err) => write!(f, "{}", err),
            PlayError::Settings(err) => write!(f, "{}", err),
            PlayError::ThreadPanicked => write!(f, "playback thread panicked"),
        }
    }
}

impl std::error::Error for PlayError {}

impl From<ScheduleError> for PlayError {
    fn from(err: ScheduleError) -> Self {
        PlayError::Schedule(err)
    }
}

impl From<AudioError> for PlayError {
    fn from(err: AudioError) -> Self {
        PlayError::Audio(err)
    }
}

impl From<SettingsError> for PlayError {
    fn from(err: SettingsError) -> Self {
        PlayError::Settings(err)
    }
}

/// Headless controller: owns a chart and runs sessions on it.
pub struct Controller<S: SettingsStore> {
    config: PlayConfig,
    settings: S,
    chart: Option<Chart>,
    playback: Option<PlaybackHandle>,
}

impl<S: SettingsStore> Controller<S> {
    pub fn new(config: PlayConfig, settings: S) -> Self {
        Self { config, settings, chart: None, playback: None }
    }

    // --- Chart management ---

    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    pub fn set_chart(&mut self, chart: Chart) {
        self.stop();
        self.chart = Some(chart);
    }

    pub fn load_chart(&mut self, data: &[u8]) -> Result<(), FormatError> {
        let chart = hl_formats::load_chart(data)?;
        self.set_chart(chart);
        Ok(())
    }

    pub fn load_chart_file(&mut self, path: &Path) -> Result<(), FormatError> {
        let chart = hl_formats::load_chart_file(path)?;
        self.set_chart(chart);
        Ok(())
    }

    pub fn config(&self) -> &PlayConfig {
        &self.config
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    /// Audio offset in timeline frames, from the settings store.
    pub fn offset_frames(&self) -> i32 {
        self.settings.audio_offset_frames()
    }

    // --- Offline play ---

    /// Autoplay the loaded chart with the stored offset.
    pub fn autoplay(&self, miss_every: usize) -> Result<AutoplayOutcome, PlayError> {
        self.autoplay_with_offset(miss_every, self.offset_frames())
    }

    pub fn autoplay_with_offset(
        &self,
        miss_every: usize,
        offset_frames: i32,
    ) -> Result<AutoplayOutcome, PlayError> {
        let chart = self.chart.as_ref().ok_or(PlayError::NoChart)?;
        let inputs = autoplay_inputs(chart, miss_every);
        Ok(run_offline(chart, &self.config, offset_frames, inputs)?)
    }

    /// One calibration attempt: play `inputs` at the loop's offset and judge it.
    pub fn calibrate(
        &mut self,
        calibration: &mut CalibrationLoop,
        inputs: Vec<LaneInput>,
    ) -> Result<(CalibrationOutcome, AutoplayOutcome), PlayError> {
        let chart = self.chart.as_ref().ok_or(PlayError::NoChart)?;
        if !chart.meta.is_calibration {
            warn!("calibrating against \"{}\", which is not a calibration chart", chart.meta.title);
        }
        let outcome = run_offline(chart, &self.config, calibration.offset_frames(), inputs)?;
        let result = calibration.finish(&outcome.report, &mut self.settings)?;
        Ok((result, outcome))
    }

    // --- Real-time playback ---

    /// Autoplay the loaded chart on the audio device in a background thread.
    pub fn play(&mut self, miss_every: usize, max_seconds: Option<f64>) -> Result<(), PlayError> {
        self.stop();
        let chart = self.chart.clone().ok_or(PlayError::NoChart)?;
        let inputs = autoplay_inputs(&chart, miss_every);
        self.playback = Some(PlaybackHandle::spawn(
            chart,
            self.config.clone(),
            self.offset_frames(),
            inputs,
            max_seconds,
        ));
        Ok(())
    }

    /// Stop realtime playback and return its report.
    pub fn stop(&mut self) -> Option<Result<SessionReport, PlayError>> {
        let mut pb = self.playback.take()?;
        pb.stop_signal.store(true, Ordering::Relaxed);
        pb.join()
    }

    /// Block until realtime playback ends on its own.
    pub fn wait(&mut self) -> Option<Result<SessionReport, PlayError>> {
        self.playback.take()?.join()
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Song position of the realtime session.
    pub fn position(&self) -> Option<f64> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        Some(f64::from_bits(pb.position.load(Ordering::Relaxed)))
    }
}

impl Default for Controller<MemorySettings> {
    fn default() -> Self {
        Self::new(PlayConfig::default(), MemorySettings::new())
    }
}

impl<S: SettingsStore> Drop for Controller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Audio offset calibration.
//!
//! The player taps along to the calibration chart. A perfect achievement
//! rate commits the offset; anything less lets the player nudge the offset
//! and try again. Nudges stay local until a run succeeds.

use hl_engine::SessionReport;
use log::info;

use crate::settings::{SettingsError, SettingsStore, AUDIO_OFFSET_KEY, CALIBRATED_KEY};

/// Frames moved by one nudge.
pub const DEFAULT_STEP_FRAMES: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// The offset was written to the settings store.
    Success { offset_frames: i32 },
    Failed { offset_frames: i32 },
}

#[derive(Clone, Debug)]
pub struct CalibrationLoop {
    offset_frames: i32,
    step: i32,
    attempts: u32,
}

impl CalibrationLoop {
    /// Start from the stored offset.
    pub fn new(store: &impl SettingsStore) -> Self {
        Self::with_offset(store.audio_offset_frames())
    }

    pub fn with_offset(offset_frames: i32) -> Self {
        Self { offset_frames, step: DEFAULT_STEP_FRAMES, attempts: 0 }
    }

    pub fn with_step(mut self, step: i32) -> Self {
        self.step = step;
        self
    }

    pub fn offset_frames(&self) -> i32 {
        self.offset_frames
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn increase(&mut self) {
        self.offset_frames = self.offset_frames.saturating_add(self.step);
    }

    pub fn decrease(&mut self) {
        self.offset_frames = self.offset_frames.saturating_sub(self.step);
    }

    /// Judge a finished calibration run.
    pub fn finish(
        &mut self,
        report: &SessionReport,
        store: &mut impl SettingsStore,
    ) -> Result<CalibrationOutcome, SettingsError> {
        self.attempts += 1;
        let offset_frames = self.offset_frames;
        if report.achievement_rate < 100.0 {
            info!(
                "calibration attempt {} failed at {:.1}% with offset {}",
                self.attempts, report.achievement_rate, offset_frames
            );
            return Ok(CalibrationOutcome::Failed { offset_frames });
        }
        store.set_int(AUDIO_OFFSET_KEY, offset_frames);
        store.set_int(CALIBRATED_KEY, 1);
        store.save()?;
        info!("calibration succeeded, offset {} frames", offset_frames);
        Ok(CalibrationOutcome::Success { offset_frames })
    }
}

//! Audio start scheduling and end-of-song detection.
//!
//! The notes clock starts at zero as soon as the clip is scheduled. The clip
//! itself starts `audio_delay` seconds later on the transport's DSP clock, so
//! the countdown and the user's calibration offset never depend on frame
//! timing. Once scheduled, the start instant is never moved by the scheduler.

use core::fmt;
use hl_chart::{frames_to_seconds, Chart};
use log::{error, info};

use crate::clock::{AudioClip, AudioTransport};

/// Delay between the notes clock starting and the audio starting.
///
/// `offset_frames` is converted to seconds on a `timeline_fps` timeline and
/// added to the countdown. The result is clamped at zero.
pub fn audio_delay(countdown_seconds: f64, offset_frames: i32, timeline_fps: f64) -> f64 {
    (countdown_seconds + frames_to_seconds(offset_frames, timeline_fps)).max(0.0)
}

/// Why a session could not start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScheduleError {
    /// No chart was supplied.
    MissingChart,
    /// No audio clip was supplied.
    MissingAudio,
    /// The clip never reported loaded within the timeout.
    LoadTimeout { waited: f64 },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::MissingChart => write!(f, "no chart to play"),
            ScheduleError::MissingAudio => write!(f, "no audio clip to play"),
            ScheduleError::LoadTimeout { waited } => {
                write!(f, "audio clip not loaded after {:.2}s", waited)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScheduleError {}

/// Result of polling for the audio start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StartPoll {
    /// Still waiting for the clip to load.
    Waiting,
    /// The clip has been scheduled; the notes clock starts now.
    Started { start_dsp: f64, audio_delay: f64 },
    /// Gave up waiting for the clip.
    TimedOut(ScheduleError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    WaitingForAudio { waited: f64 },
    Playing { start_dsp: f64, audio_seen: bool },
    Trailing { start_dsp: f64, elapsed: f64 },
    Finished,
    Failed,
}

/// Tracks one song attempt from "waiting for audio" to "finished".
#[derive(Clone, Debug)]
pub struct PlaybackScheduler {
    phase: Phase,
    audio_delay: f64,
    clip_duration: f64,
    load_timeout: f64,
    end_buffer: f64,
}

impl PlaybackScheduler {
    pub fn new(load_timeout: f64, end_buffer: f64) -> Self {
        Self {
            phase: Phase::Idle,
            audio_delay: 0.0,
            clip_duration: 0.0,
            load_timeout,
            end_buffer,
        }
    }

    /// Arm the scheduler for a new attempt.
    ///
    /// Fails without changing state if the chart or clip is absent.
    pub fn begin(
        &mut self,
        chart: Option<&Chart>,
        clip: Option<AudioClip>,
        offset_frames: i32,
        countdown_seconds: f64,
        timeline_fps: f64,
    ) -> Result<f64, ScheduleError> {
        if chart.is_none() {
            return Err(ScheduleError::MissingChart);
        }
        let clip = clip.ok_or(ScheduleError::MissingAudio)?;

        self.audio_delay = audio_delay(countdown_seconds, offset_frames, timeline_fps);
        self.clip_duration = clip.duration;
        self.phase = Phase::WaitingForAudio { waited: 0.0 };
        Ok(self.audio_delay)
    }

    /// Poll once per frame until the clip is loaded, then schedule it.
    pub fn poll_start<T: AudioTransport>(&mut self, dt: f64, transport: &mut T) -> StartPoll {
        let Phase::WaitingForAudio { waited } = self.phase else {
            return StartPoll::Waiting;
        };

        if transport.is_loaded() {
            let start_dsp = transport.dsp_time() + self.audio_delay;
            transport.schedule_start(start_dsp);
            self.phase = Phase::Playing { start_dsp, audio_seen: false };
            info!(
                "audio scheduled at dsp {:.3} ({:.3}s after notes clock)",
                start_dsp, self.audio_delay
            );
            return StartPoll::Started { start_dsp, audio_delay: self.audio_delay };
        }

        let waited = waited + dt;
        if waited >= self.load_timeout {
            error!("audio clip not loaded after {:.2}s, giving up", waited);
            self.phase = Phase::Failed;
            return StartPoll::TimedOut(ScheduleError::LoadTimeout { waited });
        }
        self.phase = Phase::WaitingForAudio { waited };
        StartPoll::Waiting
    }

    /// Poll once per unpaused frame. Returns true on the frame the song finishes.
    ///
    /// The song ends once the clip has played to its full length and the
    /// trailing buffer has elapsed on unpaused frame time.
    pub fn poll_end<T: AudioTransport>(&mut self, dt: f64, transport: &T) -> bool {
        match self.phase {
            Phase::Playing { start_dsp, audio_seen } => {
                let audio_seen = audio_seen || transport.is_playing();
                let clip_done = transport.playback_position() >= self.clip_duration;
                if clip_done && (audio_seen || self.clip_duration <= 0.0) {
                    self.phase = Phase::Trailing { start_dsp, elapsed: 0.0 };
                } else {
                    self.phase = Phase::Playing { start_dsp, audio_seen };
                }
                false
            }
            Phase::Trailing { start_dsp, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.end_buffer {
                    self.phase = Phase::Finished;
                    true
                } else {
                    self.phase = Phase::Trailing { start_dsp, elapsed };
                    false
                }
            }
            _ => false,
        }
    }

    /// DSP instant the clip starts, once scheduled.
    pub fn start_dsp(&self) -> Option<f64> {
        match self.phase {
            Phase::Playing { start_dsp, .. } | Phase::Trailing { start_dsp, .. } => Some(start_dsp),
            _ => None,
        }
    }

    pub fn audio_delay(&self) -> f64 {
        self.audio_delay
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.phase, Phase::WaitingForAudio { .. })
    }

    /// True while the clip has ended and the trailing buffer is running.
    pub fn is_trailing(&self) -> bool {
        matches!(self.phase, Phase::Trailing { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Forget the current attempt.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.audio_delay = 0.0;
        self.clip_duration = 0.0;
    }
}

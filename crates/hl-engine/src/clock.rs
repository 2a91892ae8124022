//! Audio transport seam.
//!
//! The session never touches an audio device directly. It reads a
//! sample-accurate DSP clock and schedules the clip start through this trait.
//! `hl-audio` implements it on a hardware stream; [`SimulatedTransport`]
//! implements it on a manually advanced clock for tests and offline runs.

/// An audio clip that has already been decoded by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioClip {
    /// Length in seconds.
    pub duration: f64,
}

impl AudioClip {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }
}

/// Playback control plus the hardware clock it runs on.
pub trait AudioTransport {
    /// Current DSP clock reading in seconds. Monotonic, keeps running while paused.
    fn dsp_time(&self) -> f64;

    /// True once the clip is ready to be scheduled.
    fn is_loaded(&self) -> bool;

    /// Start the clip when the DSP clock reaches `at`.
    fn schedule_start(&mut self, at: f64);

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Seconds of the clip played so far.
    fn playback_position(&self) -> f64;

    fn is_playing(&self) -> bool;

    /// Called once per frame with the frame delta. Hardware transports ignore it.
    fn advance(&mut self, _dt: f64) {}
}

/// A transport whose DSP clock advances only through [`AudioTransport::advance`].
#[derive(Clone, Debug)]
pub struct SimulatedTransport {
    dsp: f64,
    clip_duration: f64,
    load_delay: Option<f64>,
    start_at: Option<f64>,
    paused_at: Option<f64>,
    position: f64,
    stopped: bool,
}

impl SimulatedTransport {
    /// A transport whose clip is loaded immediately.
    pub fn new(clip_duration: f64) -> Self {
        Self {
            dsp: 0.0,
            clip_duration,
            load_delay: Some(0.0),
            start_at: None,
            paused_at: None,
            position: 0.0,
            stopped: false,
        }
    }

    /// Report the clip loaded only after `delay` seconds of DSP time.
    pub fn with_load_delay(mut self, delay: f64) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// A clip that never finishes loading.
    pub fn never_loads(mut self) -> Self {
        self.load_delay = None;
        self
    }

    /// DSP instant the clip is scheduled to start, if any.
    pub fn scheduled_start(&self) -> Option<f64> {
        self.start_at
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn clip_duration(&self) -> f64 {
        self.clip_duration
    }
}

impl AudioTransport for SimulatedTransport {
    fn dsp_time(&self) -> f64 {
        self.dsp
    }

    fn is_loaded(&self) -> bool {
        self.load_delay.is_some_and(|d| self.dsp >= d)
    }

    fn schedule_start(&mut self, at: f64) {
        self.start_at = Some(at);
        self.position = 0.0;
        self.stopped = false;
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.dsp);
        }
    }

    fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            // A start that had not happened yet moves back by the paused span.
            if let Some(start) = self.start_at.as_mut() {
                if *start > paused_at {
                    *start += self.dsp - paused_at;
                }
            }
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.start_at = None;
        self.paused_at = None;
    }

    fn playback_position(&self) -> f64 {
        self.position
    }

    fn is_playing(&self) -> bool {
        match self.start_at {
            Some(start) => {
                !self.stopped
                    && self.paused_at.is_none()
                    && self.dsp >= start
                    && self.position < self.clip_duration
            }
            None => false,
        }
    }

    fn advance(&mut self, dt: f64) {
        let from = self.dsp;
        self.dsp += dt.max(0.0);
        if self.stopped || self.paused_at.is_some() {
            return;
        }
        if let Some(start) = self.start_at {
            let begin = from.max(start);
            if self.dsp > begin {
                self.position = (self.position + (self.dsp - begin)).min(self.clip_duration);
            }
        }
    }
}

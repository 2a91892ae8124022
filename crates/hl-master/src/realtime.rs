use hl_audio::{render_click_track, CpalTransport};
use hl_chart::Chart;
use hl_engine::{audio_delay, AudioClip, LaneInput, PlayConfig, Session, SessionEvent, SessionPhase, SessionReport};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::autoplay::InputFeeder;
use crate::PlayError;

pub(crate) struct PlaybackHandle {
    pub stop_signal: Arc<AtomicBool>,
    /// `f64` bits of the session's song position.
    pub position: Arc<AtomicU64>,
    pub finished: Arc<AtomicBool>,
    pub thread: Option<JoinHandle<Result<SessionReport, PlayError>>>,
}

impl PlaybackHandle {
    pub fn spawn(
        chart: Chart,
        config: PlayConfig,
        offset_frames: i32,
        inputs: Vec<LaneInput>,
        max_seconds: Option<f64>,
    ) -> Self {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let position = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let pos = position.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            let result = frame_loop(&chart, &config, offset_frames, inputs, max_seconds, &stop, &pos);
            done.store(true, Ordering::Relaxed);
            result
        });

        Self { stop_signal, position, finished, thread: Some(thread) }
    }

    pub fn join(&mut self) -> Option<Result<SessionReport, PlayError>> {
        let handle = self.thread.take()?;
        Some(handle.join().unwrap_or(Err(PlayError::ThreadPanicked)))
    }
}

/// Drive a session against the audio device at roughly the timeline frame rate.
fn frame_loop(
    chart: &Chart,
    config: &PlayConfig,
    offset_frames: i32,
    inputs: Vec<LaneInput>,
    max_seconds: Option<f64>,
    stop_signal: &AtomicBool,
    position: &AtomicU64,
) -> Result<SessionReport, PlayError> {
    let delay = audio_delay(config.countdown_seconds, offset_frames, config.timeline_fps);
    let sample_rate = CpalTransport::probe_sample_rate()?;
    let samples = render_click_track(chart, sample_rate, delay);
    let clip = AudioClip::new(samples.len() as f64 / sample_rate as f64);
    let transport = CpalTransport::new(samples)?;

    let mut session = Session::new(config.clone(), transport);
    session.start(Some(chart), Some(clip), offset_frames)?;
    let mut feeder = InputFeeder::new(inputs, config);

    let frame = Duration::from_secs_f64(1.0 / config.timeline_fps.max(1.0));
    let started = Instant::now();
    let mut last = started;

    while !stop_signal.load(Ordering::Relaxed) {
        match session.phase() {
            SessionPhase::Finished | SessionPhase::Idle => break,
            SessionPhase::Paused => session.resume(),
            _ => {}
        }
        if max_seconds.is_some_and(|max| started.elapsed().as_secs_f64() >= max) {
            info!("play time limit reached");
            break;
        }

        std::thread::sleep(frame);
        let now = Instant::now();
        let dt = (now - last).as_secs_f64();
        last = now;

        feeder.feed(&mut session, dt);
        session.update(dt);
        for event in session.drain_events() {
            match event {
                SessionEvent::StartFailed(err) => return Err(err.into()),
                SessionEvent::Judgment { lane, judgment } => debug!("lane {}: {}", lane, judgment),
                _ => {}
            }
        }
        position.store(session.song_position().to_bits(), Ordering::Relaxed);
    }

    let report = session.report().unwrap_or_else(|| session.score().report());
    if session.phase() != SessionPhase::Finished {
        session.abort();
    }
    Ok(report)
}

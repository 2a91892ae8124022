//! CPAL-based audio transport.
//!
//! The output callback owns the clip and counts every device frame it
//! renders. That count is the DSP clock: it is published through an atomic
//! and never depends on how often the frame loop runs. Control commands
//! reach the callback through a lock-free ring buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use hl_engine::AudioTransport;
use log::{error, info, warn};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::AudioError;

#[derive(Clone, Copy, Debug)]
enum Command {
    /// Start the clip at this DSP frame.
    Schedule(u64),
    Pause,
    Resume,
    Stop,
}

/// State published by the audio callback.
#[derive(Default)]
struct Shared {
    dsp_frames: AtomicU64,
    clip_frames: AtomicU64,
    playing: AtomicBool,
    loaded: AtomicBool,
}

/// Callback-side playback state.
struct Player {
    clip: Vec<f32>,
    commands: HeapCons<Command>,
    shared: Arc<Shared>,
    now: u64,
    start: Option<u64>,
    paused_at: Option<u64>,
    pos: usize,
}

impl Player {
    fn apply(&mut self, command: Command) {
        match command {
            Command::Schedule(frame) => {
                self.start = Some(frame);
                self.pos = 0;
            }
            Command::Pause => {
                self.paused_at.get_or_insert(self.now);
            }
            Command::Resume => {
                if let Some(paused_at) = self.paused_at.take() {
                    if let Some(start) = self.start.as_mut() {
                        if *start > paused_at {
                            *start += self.now - paused_at;
                        }
                    }
                }
            }
            Command::Stop => {
                self.start = None;
                self.paused_at = None;
            }
        }
    }

    fn render(&mut self, data: &mut [f32], channels: usize) {
        while let Some(command) = self.commands.try_pop() {
            self.apply(command);
        }

        for chunk in data.chunks_mut(channels) {
            let active = self.paused_at.is_none()
                && self.start.is_some_and(|s| self.now >= s)
                && self.pos < self.clip.len();
            let sample = if active {
                let v = self.clip[self.pos];
                self.pos += 1;
                v
            } else {
                0.0
            };
            for out in chunk.iter_mut() {
                *out = sample;
            }
            self.now += 1;
        }

        let playing = self.paused_at.is_none()
            && self.start.is_some_and(|s| self.now >= s)
            && self.pos < self.clip.len();
        self.shared.dsp_frames.store(self.now, Ordering::Release);
        self.shared.clip_frames.store(self.pos as u64, Ordering::Release);
        self.shared.playing.store(playing, Ordering::Release);
        self.shared.loaded.store(true, Ordering::Release);
    }
}

/// Audio transport on the default output device.
///
/// The clip is mono at the device sample rate (see [`CpalTransport::sample_rate`]).
/// It counts as loaded once the device has pulled its first buffer.
pub struct CpalTransport {
    _stream: Stream,
    sample_rate: u32,
    commands: HeapProd<Command>,
    shared: Arc<Shared>,
}

impl CpalTransport {
    /// Open the default device, returning its sample rate before any clip exists.
    pub fn probe_sample_rate() -> Result<u32, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        Ok(config.sample_rate().0)
    }

    /// Build and start a stream that will play `clip` once scheduled.
    pub fn new(clip: Vec<f32>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!("{:?}", supported.sample_format())));
        }
        let config: StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;

        let (commands, consumer) = HeapRb::<Command>::new(64).split();
        let shared = Arc::new(Shared::default());
        let mut player = Player {
            clip,
            commands: consumer,
            shared: shared.clone(),
            now: 0,
            start: None,
            paused_at: None,
            pos: 0,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| player.render(data, channels),
                |err| error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;
        stream.play().map_err(|e| AudioError::StreamStart(e.to_string()))?;
        info!("audio stream open: {} Hz, {} channels", sample_rate, channels);

        Ok(Self { _stream: stream, sample_rate, commands, shared })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn send(&mut self, command: Command) {
        if self.commands.try_push(command).is_err() {
            warn!("audio command queue full, dropping {:?}", command);
        }
    }

    fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate as f64
    }
}

impl AudioTransport for CpalTransport {
    fn dsp_time(&self) -> f64 {
        self.frames_to_seconds(self.shared.dsp_frames.load(Ordering::Acquire))
    }

    fn is_loaded(&self) -> bool {
        self.shared.loaded.load(Ordering::Acquire)
    }

    fn schedule_start(&mut self, at: f64) {
        let frame = (at.max(0.0) * self.sample_rate as f64) as u64;
        self.send(Command::Schedule(frame));
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn resume(&mut self) {
        self.send(Command::Resume);
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }

    fn playback_position(&self) -> f64 {
        self.frames_to_seconds(self.shared.clip_frames.load(Ordering::Acquire))
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }
}

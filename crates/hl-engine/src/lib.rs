//! Playback engine for hitline.
//!
//! Schedules the audio start against the notes clock, spawns and retires
//! pooled note instances, and judges lane input against them. A host drives
//! everything through [`Session::update`] once per rendered frame and drains
//! [`SessionEvent`]s afterwards.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod clock;
mod config;
mod effects;
mod events;
mod judgment;
mod lane;
mod notes;
mod pool;
pub mod scheduler;
mod score;
mod session;
mod spawn_queue;

pub use clock::{AudioClip, AudioTransport, SimulatedTransport};
pub use config::PlayConfig;
pub use effects::{EffectInstance, EffectKind, EffectRuntime, EffectView};
pub use events::{EventBuffer, SessionEvent, EVENT_CAPACITY};
pub use judgment::{Judgment, JudgmentEngine};
pub use lane::{ArmError, HeldNote, LaneState};
pub use notes::{NoteInstance, NoteRuntime, NoteState, NoteView};
pub use pool::{InstanceId, Pool};
pub use scheduler::{audio_delay, PlaybackScheduler, ScheduleError, StartPoll};
pub use score::{ScoreState, SessionReport};
pub use session::{LaneInput, Session, SessionPhase, INPUT_CAPACITY};
pub use spawn_queue::{SpawnEntry, SpawnQueue};

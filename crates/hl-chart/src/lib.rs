//! Chart model for the hitline rhythm engine.
//!
//! A chart is the ordered list of notes for one song. The recorder emits
//! charts, the file codecs store them, and the session engine consumes
//! them read-only during play.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod analysis;
mod chart;
mod note;
mod time;

pub use analysis::{analyze, ChartStats};
pub use chart::{Chart, ChartError, SongMeta, DEFAULT_LANE_COUNT};
pub use note::{NoteEvent, NoteKind};
pub use time::{frames_to_seconds, seconds_to_frames};

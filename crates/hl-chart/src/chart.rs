//! Chart structure and validation.

use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::fmt;

use crate::note::{NoteEvent, NoteKind};

/// Lane count used when a chart does not say otherwise.
pub const DEFAULT_LANE_COUNT: u8 = 4;

/// Song metadata carried alongside the notes.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SongMeta {
    pub title: ArrayString<64>,
    pub artist: ArrayString<64>,
    /// Set on the chart that drives the calibration loop.
    pub is_calibration: bool,
}

impl SongMeta {
    /// Create metadata with a title. Titles longer than 64 bytes are dropped.
    pub fn new(title: &str) -> Self {
        let mut meta = Self::default();
        let _ = meta.title.try_push_str(title);
        meta
    }

    pub fn with_artist(mut self, artist: &str) -> Self {
        self.artist.clear();
        let _ = self.artist.try_push_str(artist);
        self
    }

    pub fn calibration(mut self) -> Self {
        self.is_calibration = true;
        self
    }
}

/// A complete, sorted chart for one song.
///
/// Notes are held in non-decreasing `hit_time` order. Notes that share a
/// time keep the order they were given in.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    pub meta: SongMeta,
    lane_count: u8,
    notes: Vec<NoteEvent>,
    total_note_count: usize,
}

impl Chart {
    /// Build a chart, stably sorting `notes` by hit time.
    pub fn new(meta: SongMeta, lane_count: u8, mut notes: Vec<NoteEvent>) -> Self {
        notes.sort_by(|a, b| a.hit_time.total_cmp(&b.hit_time));
        let total_note_count = notes.iter().filter(|n| n.is_judged()).count();
        Self { meta, lane_count, notes, total_note_count }
    }

    /// An empty chart with the given lane count.
    pub fn empty(lane_count: u8) -> Self {
        Self::new(SongMeta::default(), lane_count, Vec::new())
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn lane_count(&self) -> u8 {
        self.lane_count
    }

    /// Number of judgment-bearing notes (everything except breakpoints).
    pub fn total_note_count(&self) -> usize {
        self.total_note_count
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time at which the last note stops asking for input.
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(NoteEvent::end_time)
            .fold(0.0, f64::max)
    }

    /// Check structural invariants, reporting the first violation found.
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.lane_count == 0 {
            return Err(ChartError::NoLanes);
        }
        let mut prev = 0.0;
        for (index, note) in self.notes.iter().enumerate() {
            if !note.hit_time.is_finite() || !note.hold_duration.is_finite() {
                return Err(ChartError::NonFinite { index });
            }
            if note.hit_time < 0.0 {
                return Err(ChartError::NegativeTime { index });
            }
            if note.hit_time < prev {
                return Err(ChartError::Unsorted { index });
            }
            if note.lane >= self.lane_count {
                return Err(ChartError::LaneOutOfRange { index, lane: note.lane });
            }
            match note.kind {
                NoteKind::Hold if note.hold_duration <= 0.0 => {
                    return Err(ChartError::HoldWithoutDuration { index });
                }
                NoteKind::Tap | NoteKind::Breakpoint if note.hold_duration != 0.0 => {
                    return Err(ChartError::UnexpectedDuration { index });
                }
                _ => {}
            }
            prev = note.hit_time;
        }
        Ok(())
    }
}

/// A chart invariant that does not hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartError {
    /// The chart declares zero lanes.
    NoLanes,
    /// A time or duration is NaN or infinite.
    NonFinite { index: usize },
    /// A hit time is before the start of the chart.
    NegativeTime { index: usize },
    /// A hit time is earlier than the note before it.
    Unsorted { index: usize },
    /// A note addresses a lane the chart does not have.
    LaneOutOfRange { index: usize, lane: u8 },
    /// A hold note with a non-positive duration.
    HoldWithoutDuration { index: usize },
    /// A tap or breakpoint carrying a hold duration.
    UnexpectedDuration { index: usize },
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::NoLanes => write!(f, "chart has no lanes"),
            ChartError::NonFinite { index } => write!(f, "note {}: non-finite time", index),
            ChartError::NegativeTime { index } => write!(f, "note {}: negative hit time", index),
            ChartError::Unsorted { index } => write!(f, "note {}: out of order", index),
            ChartError::LaneOutOfRange { index, lane } => {
                write!(f, "note {}: lane {} out of range", index, lane)
            }
            ChartError::HoldWithoutDuration { index } => {
                write!(f, "note {}: hold without duration", index)
            }
            ChartError::UnexpectedDuration { index } => {
                write!(f, "note {}: duration on a non-hold note", index)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChartError {}

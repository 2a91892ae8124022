//! Note events.

use core::fmt;

/// What a note asks of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteKind {
    /// Single press at the hit time.
    #[default]
    Tap,
    /// Press at the hit time and keep the lane down for `hold_duration`.
    Hold,
    /// Not judged. Pauses playback when it reaches the judgment line.
    Breakpoint,
}

impl NoteKind {
    pub fn name(self) -> &'static str {
        match self {
            NoteKind::Tap => "Tap",
            NoteKind::Hold => "Hold",
            NoteKind::Breakpoint => "Breakpoint",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One chart entry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    /// Lane index, `0..lane_count`.
    pub lane: u8,
    /// Seconds from chart start.
    pub hit_time: f64,
    pub kind: NoteKind,
    /// Seconds; zero unless `kind` is `Hold`.
    pub hold_duration: f64,
}

impl NoteEvent {
    pub fn tap(lane: u8, hit_time: f64) -> Self {
        Self { lane, hit_time, kind: NoteKind::Tap, hold_duration: 0.0 }
    }

    pub fn hold(lane: u8, hit_time: f64, hold_duration: f64) -> Self {
        Self { lane, hit_time, kind: NoteKind::Hold, hold_duration }
    }

    pub fn breakpoint(lane: u8, hit_time: f64) -> Self {
        Self { lane, hit_time, kind: NoteKind::Breakpoint, hold_duration: 0.0 }
    }

    /// True for notes that count toward judgment and the achievement rate.
    pub fn is_judged(&self) -> bool {
        self.kind != NoteKind::Breakpoint
    }

    /// Time the note stops asking for input.
    pub fn end_time(&self) -> f64 {
        self.hit_time + self.hold_duration
    }
}

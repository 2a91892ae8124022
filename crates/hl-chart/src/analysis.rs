//! Chart feature analysis: scans a chart to report what it asks of the player.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::chart::Chart;
use crate::note::NoteKind;

/// Summary of a chart's contents.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartStats {
    pub taps: usize,
    pub holds: usize,
    pub breakpoints: usize,
    /// Judged notes per lane.
    pub per_lane: Vec<usize>,
    /// Groups of two or more judged notes sharing a hit time.
    pub chords: usize,
    /// Sum of all hold durations in seconds.
    pub total_hold_seconds: f64,
    /// Time the last note ends.
    pub duration: f64,
    /// Most judged notes starting inside any one-second window.
    pub peak_density: usize,
}

/// Analyze a chart and return a summary of its contents.
pub fn analyze(chart: &Chart) -> ChartStats {
    let mut stats = ChartStats {
        taps: 0,
        holds: 0,
        breakpoints: 0,
        per_lane: vec![0; chart.lane_count() as usize],
        chords: 0,
        total_hold_seconds: 0.0,
        duration: chart.duration(),
        peak_density: 0,
    };

    let notes = chart.notes();
    let mut chord_len = 0usize;
    let mut chord_time = f64::NAN;
    let mut window_start = 0usize;
    let mut judged: Vec<f64> = Vec::with_capacity(chart.total_note_count());

    for note in notes {
        match note.kind {
            NoteKind::Tap => stats.taps += 1,
            NoteKind::Hold => {
                stats.holds += 1;
                stats.total_hold_seconds += note.hold_duration;
            }
            NoteKind::Breakpoint => {
                stats.breakpoints += 1;
                continue;
            }
        }
        if let Some(count) = stats.per_lane.get_mut(note.lane as usize) {
            *count += 1;
        }

        if note.hit_time == chord_time {
            chord_len += 1;
            if chord_len == 2 {
                stats.chords += 1;
            }
        } else {
            chord_time = note.hit_time;
            chord_len = 1;
        }

        judged.push(note.hit_time);
        while note.hit_time - judged[window_start] >= 1.0 {
            window_start += 1;
        }
        stats.peak_density = stats.peak_density.max(judged.len() - window_start);
    }

    stats
}

impl fmt::Display for ChartStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Notes:    {} tap, {} hold, {} breakpoint",
            self.taps, self.holds, self.breakpoints
        )?;
        write!(f, "Lanes:   ")?;
        for count in &self.per_lane {
            write!(f, " {}", count)?;
        }
        writeln!(f)?;
        writeln!(f, "Chords:   {}", self.chords)?;
        writeln!(f, "Held:     {:.2}s", self.total_hold_seconds)?;
        writeln!(f, "Length:   {:.2}s", self.duration)?;
        writeln!(f, "Peak:     {} notes/s", self.peak_density)
    }
}

//! Click-track synthesis.
//!
//! Hosts without decoded music can still exercise the full audio path by
//! playing one click per chart note.

use hl_chart::{Chart, NoteKind};

/// Length of one click.
pub const CLICK_SECONDS: f64 = 0.03;

const CLICK_HZ: f32 = 1000.0;
const ACCENT_HZ: f32 = 1500.0;

/// Render a mono clip with a click at every judged note.
///
/// Audio starts `lead_seconds` after the notes clock, so a note at chart
/// time `t` clicks at clip time `t - lead_seconds`. Notes that would click
/// before the clip starts are skipped. The clip runs one second past the
/// last note.
pub fn render_click_track(chart: &Chart, sample_rate: u32, lead_seconds: f64) -> Vec<f32> {
    let rate = sample_rate as f64;
    let length = (chart.duration() - lead_seconds + 1.0).max(0.0);
    let mut clip = vec![0.0f32; (length * rate) as usize];
    let click_len = (CLICK_SECONDS * rate) as usize;

    for note in chart.notes() {
        let freq = match note.kind {
            NoteKind::Tap => CLICK_HZ,
            NoteKind::Hold => ACCENT_HZ,
            NoteKind::Breakpoint => continue,
        };
        let at = note.hit_time - lead_seconds;
        if at < 0.0 {
            continue;
        }
        let start = (at * rate) as usize;
        for i in 0..click_len {
            let Some(sample) = clip.get_mut(start + i) else { break };
            let t = i as f32 / sample_rate as f32;
            let env = 1.0 - i as f32 / click_len as f32;
            *sample += 0.5 * env * (2.0 * std::f32::consts::PI * freq * t).sin();
        }
    }
    clip
}

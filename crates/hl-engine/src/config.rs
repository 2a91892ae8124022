//! Play configuration.

use hl_chart::DEFAULT_LANE_COUNT;

/// Constants a session needs from its host.
///
/// Distances are in travel units along the lane; the judgment line sits at
/// position zero and notes approach from positive positions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct PlayConfig {
    pub lane_count: u8,
    /// Distance from the spawn point to the judgment line.
    pub spawn_distance: f64,
    /// Travel units per second.
    pub note_speed: f64,
    /// Half-width of the band around the judgment line where notes are armed.
    pub trigger_distance: f64,
    pub perfect_distance: f64,
    pub good_distance: f64,
    /// Tighter windows for the head of a hold note.
    pub hold_perfect_distance: f64,
    pub hold_good_distance: f64,
    /// Distance past the judgment line after which stray notes are retired.
    pub cleanup_distance: f64,
    /// Seconds between combo ticks while a hold is held.
    pub hold_tick_interval: f64,
    /// Frame rate of the authoring timeline; calibration offsets are in its frames.
    pub timeline_fps: f64,
    /// Pre-roll before the audio starts.
    pub countdown_seconds: f64,
    /// Time after the clip ends before the session reports completion.
    pub end_buffer_seconds: f64,
    /// Longest wait for the audio clip to report loaded.
    pub audio_load_timeout: f64,
    /// Platform constant added to the notes clock.
    pub sync_offset: f64,
    pub perfect_points: u32,
    pub good_points: u32,
    pub hold_complete_points: u32,
    pub note_pool_size: usize,
    pub effect_pool_size: usize,
    /// How long a one-shot hit effect stays alive.
    pub effect_lifetime: f64,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            spawn_distance: 30.0,
            note_speed: 10.0,
            trigger_distance: 4.0,
            perfect_distance: 2.0,
            good_distance: 4.0,
            hold_perfect_distance: 0.5,
            hold_good_distance: 1.5,
            cleanup_distance: 10.0,
            hold_tick_interval: 0.1,
            timeline_fps: 60.0,
            countdown_seconds: 3.0,
            end_buffer_seconds: 2.0,
            audio_load_timeout: 5.0,
            sync_offset: 0.0,
            perfect_points: 100,
            good_points: 50,
            hold_complete_points: 100,
            note_pool_size: 32,
            effect_pool_size: 16,
            effect_lifetime: 0.5,
        }
    }
}

impl PlayConfig {
    /// Seconds a note spends between spawn and the judgment line.
    pub fn travel_time(&self) -> f64 {
        if self.note_speed <= 0.0 {
            return 0.0;
        }
        self.spawn_distance / self.note_speed
    }
}

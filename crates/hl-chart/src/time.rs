//! Conversions between timeline frames and seconds.
//!
//! Calibration offsets are stored as integer frames of the authoring
//! timeline (60 fps by default). Playback works in seconds.

/// Convert a frame count on a `fps` timeline to seconds.
///
/// A non-positive frame rate yields zero rather than infinity.
pub fn frames_to_seconds(frames: i32, fps: f64) -> f64 {
    if fps <= 0.0 {
        return 0.0;
    }
    frames as f64 / fps
}

/// Convert seconds to the nearest whole frame on a `fps` timeline.
pub fn seconds_to_frames(seconds: f64, fps: f64) -> i32 {
    let frames = seconds * fps;
    // Round half away from zero without pulling in libm.
    if frames >= 0.0 {
        (frames + 0.5) as i32
    } else {
        (frames - 0.5) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_round_trip_at_sixty() {
        assert_eq!(frames_to_seconds(60, 60.0), 1.0);
        assert_eq!(frames_to_seconds(-300, 60.0), -5.0);
        assert_eq!(seconds_to_frames(5.0, 60.0), 300);
        assert_eq!(seconds_to_frames(-0.5, 60.0), -30);
    }

    #[test]
    fn zero_fps_is_zero() {
        assert_eq!(frames_to_seconds(100, 0.0), 0.0);
    }
}

//! Binary chart format (`.hlc`).
//!
//! Layout, all little-endian:
//!
//! ```text
//! magic        4  "HLCH"
//! version      u16
//! lane_count   u8
//! flags        u8   bit 0: calibration chart
//! title        u16 length + UTF-8
//! artist       u16 length + UTF-8
//! note_count   u32
//! notes        note_count x { lane u8, kind u8, hit_time f64, hold_duration f64 }
//! ```

use std::path::Path;

use hl_chart::{Chart, NoteEvent, NoteKind, SongMeta};

use crate::FormatError;

pub const CHART_MAGIC: &[u8; 4] = b"HLCH";
pub const CHART_VERSION: u16 = 1;

const FLAG_CALIBRATION: u8 = 0x01;

// ---------------------------------------------------------------------------
// ChartReader: cursor over a byte slice
// ---------------------------------------------------------------------------

struct ChartReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChartReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.data.len() {
            return Err(FormatError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f64_le(&mut self) -> Result<f64, FormatError> {
        let b = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(f64::from_le_bytes(buf))
    }

    fn read_string(&mut self) -> Result<&'a str, FormatError> {
        let len = self.read_u16_le()? as usize;
        let bytes = self.read_bytes(len)?;
        core::str::from_utf8(bytes).map_err(|_| FormatError::InvalidHeader)
    }
}

fn kind_from_byte(byte: u8) -> Option<NoteKind> {
    match byte {
        0 => Some(NoteKind::Tap),
        1 => Some(NoteKind::Hold),
        2 => Some(NoteKind::Breakpoint),
        _ => None,
    }
}

fn kind_to_byte(kind: NoteKind) -> u8 {
    match kind {
        NoteKind::Tap => 0,
        NoteKind::Hold => 1,
        NoteKind::Breakpoint => 2,
    }
}

/// Decode and validate a chart.
pub fn load_chart(data: &[u8]) -> Result<Chart, FormatError> {
    let mut r = ChartReader::new(data);
    if r.read_bytes(4)? != CHART_MAGIC {
        return Err(FormatError::InvalidHeader);
    }
    let version = r.read_u16_le()?;
    if version != CHART_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    let lane_count = r.read_u8()?;
    let flags = r.read_u8()?;

    let mut meta = SongMeta::new(r.read_string()?).with_artist(r.read_string()?);
    meta.is_calibration = flags & FLAG_CALIBRATION != 0;

    let count = r.read_u32_le()? as usize;
    // Each note record is 18 bytes; refuse counts the data cannot hold.
    if count.saturating_mul(18) > data.len() - r.pos {
        return Err(FormatError::UnexpectedEof);
    }
    let mut notes = Vec::with_capacity(count);
    for index in 0..count {
        let lane = r.read_u8()?;
        let kind = kind_from_byte(r.read_u8()?).ok_or(FormatError::InvalidNote { index })?;
        let hit_time = r.read_f64_le()?;
        let hold_duration = r.read_f64_le()?;
        notes.push(NoteEvent { lane, hit_time, kind, hold_duration });
    }

    let chart = Chart::new(meta, lane_count, notes);
    chart.validate().map_err(FormatError::InvalidChart)?;
    Ok(chart)
}

/// Encode a chart. Titles and artists are stored as given.
pub fn save_chart(chart: &Chart) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + chart.len() * 18);
    out.extend_from_slice(CHART_MAGIC);
    out.extend_from_slice(&CHART_VERSION.to_le_bytes());
    out.push(chart.lane_count());
    out.push(if chart.meta.is_calibration { FLAG_CALIBRATION } else { 0 });
    for s in [chart.meta.title.as_str(), chart.meta.artist.as_str()] {
        out.extend_from_slice(&(s.len() as u16).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
    }
    out.extend_from_slice(&(chart.len() as u32).to_le_bytes());
    for note in chart.notes() {
        out.push(note.lane);
        out.push(kind_to_byte(note.kind));
        out.extend_from_slice(&note.hit_time.to_le_bytes());
        out.extend_from_slice(&note.hold_duration.to_le_bytes());
    }
    out
}

pub fn load_chart_file(path: &Path) -> Result<Chart, FormatError> {
    let data = std::fs::read(path)?;
    load_chart(&data)
}

pub fn save_chart_file(path: &Path, chart: &Chart) -> Result<(), FormatError> {
    std::fs::write(path, save_chart(chart))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Chart {
        Chart::new(
            SongMeta::new("Calibrate").with_artist("hitline").calibration(),
            4,
            vec![
                NoteEvent::tap(0, 1.0),
                NoteEvent::hold(1, 1.5, 0.75),
                NoteEvent::breakpoint(2, 3.0),
            ],
        )
    }

    #[test]
    fn load_restores_saved_chart() {
        let chart = sample();
        let loaded = load_chart(&save_chart(&chart)).unwrap();
        assert_eq!(loaded, chart);
        assert!(loaded.meta.is_calibration);
        assert_eq!(loaded.total_note_count(), 2);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = save_chart(&sample());
        data[0] = b'X';
        assert!(matches!(load_chart(&data), Err(FormatError::InvalidHeader)));
    }

    #[test]
    fn rejects_future_version() {
        let mut data = save_chart(&sample());
        data[4] = 9;
        assert!(matches!(load_chart(&data), Err(FormatError::UnsupportedVersion(9))));
    }

    #[test]
    fn truncated_file_is_eof() {
        let data = save_chart(&sample());
        assert!(matches!(
            load_chart(&data[..data.len() - 3]),
            Err(FormatError::UnexpectedEof)
        ));
    }

    #[test]
    fn unknown_kind_is_invalid_note() {
        let chart = Chart::new(SongMeta::default(), 4, vec![NoteEvent::tap(0, 1.0)]);
        let mut data = save_chart(&chart);
        let kind_at = data.len() - 17;
        data[kind_at] = 7;
        assert!(matches!(load_chart(&data), Err(FormatError::InvalidNote { index: 0 })));
    }

    #[test]
    fn out_of_range_lane_is_invalid_chart() {
        let chart = Chart::new(SongMeta::default(), 2, vec![NoteEvent::tap(5, 1.0)]);
        assert!(matches!(
            load_chart(&save_chart(&chart)),
            Err(FormatError::InvalidChart(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.hlc");
        save_chart_file(&path, &sample()).unwrap();
        assert_eq!(load_chart_file(&path).unwrap(), sample());
    }
}

//! Chart authoring and storage for hitline.
//!
//! The recorder turns lane press/release timestamps into a quantized chart.
//! Charts are stored in the binary `.hlc` format; raw input is stored as a
//! line-based text log.

mod chart_file;
mod input_log;
mod recorder;

pub use chart_file::{load_chart, load_chart_file, save_chart, save_chart_file, CHART_MAGIC, CHART_VERSION};
pub use input_log::{parse_input_log, write_input_log};
pub use recorder::{quantize_chords, record, Recorder, RecorderConfig, RecorderState};

use core::fmt;
use hl_chart::ChartError;

/// Why a chart file or input log could not be read.
#[derive(Debug)]
pub enum FormatError {
    /// Missing `HLCH` magic
    InvalidHeader,
    /// Chart data ends mid-record
    UnexpectedEof,
    /// Written by a newer chart format
    UnsupportedVersion(u16),
    /// A note record with an unknown kind or bad string data
    InvalidNote { index: usize },
    /// The decoded chart breaks a chart invariant
    InvalidChart(ChartError),
    /// Malformed line in a text input log
    Parse { line: usize, message: String },
    Io(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidHeader => write!(f, "invalid chart header"),
            FormatError::UnexpectedEof => write!(f, "unexpected end of file"),
            FormatError::UnsupportedVersion(v) => write!(f, "unsupported chart version {}", v),
            FormatError::InvalidNote { index } => write!(f, "invalid note record {}", index),
            FormatError::InvalidChart(err) => write!(f, "invalid chart: {}", err),
            FormatError::Parse { line, message } => write!(f, "line {}: {}", line, message),
            FormatError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io(err.to_string())
    }
}

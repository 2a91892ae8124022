use core::fmt;

/// Why the audio transport could not be opened.
#[derive(Debug)]
pub enum AudioError {
    /// No default output device
    NoDevice,
    /// The device refused to report its output configuration
    DeviceInit(String),
    /// The device does not take `f32` samples
    UnsupportedFormat(String),
    /// Failed to build the output stream
    StreamCreate(String),
    /// The stream was built but would not start
    StreamStart(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoDevice => write!(f, "no audio output device"),
            AudioError::DeviceInit(msg) => write!(f, "audio device error: {}", msg),
            AudioError::UnsupportedFormat(fmt) => write!(f, "unsupported sample format {}", fmt),
            AudioError::StreamCreate(msg) => write!(f, "failed to build audio stream: {}", msg),
            AudioError::StreamStart(msg) => write!(f, "failed to start audio stream: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

//! Persistent user settings.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use hl_engine::PlayConfig;
use log::{debug, info};

/// Calibrated audio offset, in timeline frames.
pub const AUDIO_OFFSET_KEY: &str = "UserAudioOffsetFrames";
/// Set to 1 once a calibration run has succeeded.
pub const CALIBRATED_KEY: &str = "HasCompletedInitialCalibration";
/// Offset used before the first calibration.
pub const DEFAULT_AUDIO_OFFSET_FRAMES: i32 = 300;

#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    /// The settings file is not a flat JSON object of integers
    Parse(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(msg) => write!(f, "settings I/O error: {}", msg),
            SettingsError::Parse(msg) => write!(f, "settings parse error: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err.to_string())
    }
}

/// Integer key/value store. Writes are buffered until [`SettingsStore::save`].
pub trait SettingsStore {
    fn get_int(&self, key: &str, default: i32) -> i32;

    fn set_int(&mut self, key: &str, value: i32);

    fn save(&mut self) -> Result<(), SettingsError>;

    fn audio_offset_frames(&self) -> i32 {
        self.get_int(AUDIO_OFFSET_KEY, DEFAULT_AUDIO_OFFSET_FRAMES)
    }

    fn is_calibrated(&self) -> bool {
        self.get_int(CALIBRATED_KEY, 0) != 0
    }
}

/// In-memory store; `save` only counts calls.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, i32>,
    saves: usize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemorySettings {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), SettingsError> {
        self.saves += 1;
        Ok(())
    }
}

/// Settings kept as a flat `{"key": int}` JSON object on disk.
#[derive(Debug)]
pub struct JsonSettings {
    path: PathBuf,
    values: BTreeMap<String, i32>,
}

impl JsonSettings {
    /// Open `path`. A missing file starts empty and is created on save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            debug!("no settings at {}, starting empty", path.display());
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettings {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        info!("settings saved to {}", self.path.display());
        Ok(())
    }
}

/// Read a [`PlayConfig`] from JSON. Missing fields keep their defaults.
pub fn load_play_config(path: &Path) -> Result<PlayConfig, SettingsError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

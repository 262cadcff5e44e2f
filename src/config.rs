//! Session configuration
//!
//! Stored as JSON under the user config dir. Loading is tolerant: a missing
//! or unparsable file falls back to defaults with a warning, and unknown or
//! absent fields take their default values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::{CAPTURE_BLOCK_SIZE, FILE_CHUNK_SIZE, TARGET_SAMPLE_RATE};

const CONFIG_DIR_NAME: &str = "callstream";
const CONFIG_FILE_NAME: &str = "config.json";

/// Default transcription service endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8765/ws/transcribe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// WebSocket endpoint of the transcription service.
    pub endpoint: String,

    /// Wire sample rate; capture and file replay both convert to this.
    pub target_sample_rate: u32,

    /// Samples per block emitted by live capture.
    pub capture_block_size: usize,

    /// Samples per chunk during file replay.
    pub file_chunk_size: usize,

    /// Pause between file-replay chunks, in milliseconds.
    pub replay_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            target_sample_rate: TARGET_SAMPLE_RATE,
            capture_block_size: CAPTURE_BLOCK_SIZE,
            file_chunk_size: FILE_CHUNK_SIZE,
            replay_interval_ms: 200,
        }
    }
}

impl SessionConfig {
    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the user config dir, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Config: could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<SessionConfig>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Config: failed to parse {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Config: failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save to the user config dir.
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory {:?}: {}", parent, e))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, contents).map_err(|e| format!("Failed to write {:?}: {}", path, e))
    }
}

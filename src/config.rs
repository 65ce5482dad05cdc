//! Console configuration.
//!
//! Everything has a default; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CommanderError, Result};
use crate::io::IOLimits;

/// Settings for one console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    /// Limits applied when loading the image file.
    pub io: IOLimits,
    /// Number of bytes shown by `printc` and `printx` (default: 100).
    pub fetch_size: u64,
    /// Text printed before each command is read (default: "$ ").
    pub prompt: String,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            io: IOLimits::default(),
            fetch_size: 100,
            prompt: "$ ".to_string(),
        }
    }
}

impl CommanderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CommanderError::Config(e.to_string()))?;
        if config.fetch_size == 0 {
            return Err(CommanderError::Config(
                "fetch_size must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.as_ref().display(), ?config, "Loaded configuration");
        Ok(config)
    }
}

//! Start-up configuration from `config.toml`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chordpad_core::{DEFAULT_BPM, EngineConfig, Rescheduling};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Substring of the output port name; first port when unset
    pub port: Option<String>,
    pub client_name: String,
    /// Zero-based MIDI channel
    pub channel: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port: None,
            client_name: "chordpad".to_string(),
            channel: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub bpm: u16,
    /// Event loop period in milliseconds
    pub tick_ms: u64,
    pub seed: Option<u64>,
    pub rescheduling: Rescheduling,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            tick_ms: 10,
            seed: None,
            rescheduling: Rescheduling::default(),
        }
    }
}

impl EngineSection {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            bpm: self.bpm,
            seed: self.seed,
            rescheduling: self.rescheduling,
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chordpad")
        .join("config.toml")
}

/// Load `path`, or the default location when `None`. A missing file at the
/// default location yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (config_path(), false),
    };

    if !required && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("parsing config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<AppConfig> {
    Ok(toml::from_str(text)?)
}

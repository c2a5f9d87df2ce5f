//! Configuration management for the equalizer
//!
//! This module provides:
//! - `ParameterState`: a plain-value copy of every parameter, used for host
//!   state save/restore (JSON) and presets (TOML)
//! - `EqPreset` and an async `PresetManager` for named presets on disk
//! - `AppConfig` for the command-line front end

use crate::domain::params::{ParamId, ParameterStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("State encoding error: {0}")]
    State(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),
}

/// Plain values of every parameter, keyed by string identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterState {
    pub values: BTreeMap<String, f32>,
}

impl ParameterState {
    /// Copy the current value of every parameter out of the store
    pub fn capture(store: &ParameterStore) -> Self {
        let values = store
            .iter()
            .map(|(id, value)| (id.id().to_string(), value))
            .collect();
        Self { values }
    }

    /// Write the stored values back into the store
    ///
    /// Unknown identifiers are skipped, parameters missing from the state keep
    /// their current value. Returns how many parameters were written.
    pub fn apply(&self, store: &ParameterStore) -> usize {
        let mut applied = 0;
        for (name, &value) in &self.values {
            match name.parse::<ParamId>() {
                Ok(id) => {
                    store.set(id, value);
                    applied += 1;
                }
                Err(_) => warn!(parameter = %name, "Ignoring unknown parameter in state"),
            }
        }
        applied
    }

    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.values.get(id.id()).copied()
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        self.values.insert(id.id().to_string(), value);
    }

    /// Host state blob
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Named parameter preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: ParameterState,
}

impl EqPreset {
    /// Preset holding the store's current values
    pub fn from_store(name: &str, store: &ParameterStore) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            parameters: ParameterState::capture(store),
        }
    }

    /// Built-in presets
    pub fn factory_presets() -> Vec<Self> {
        let preset = |name: &str, description: &str, values: &[(ParamId, f32)]| {
            let mut parameters = ParameterState::capture(&ParameterStore::new());
            for &(id, value) in values {
                parameters.set(id, value);
            }
            Self {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            }
        };

        vec![
            preset("flat", "Every band at its neutral setting", &[]),
            preset(
                "telephone",
                "Narrow voice band",
                &[
                    (ParamId::LowCutFreq, 300.0),
                    (ParamId::LowCutSlope, 3.0),
                    (ParamId::HighCutFreq, 3400.0),
                    (ParamId::HighCutSlope, 3.0),
                    (ParamId::PeakFreq, 1500.0),
                    (ParamId::PeakGain, 6.0),
                    (ParamId::PeakQuality, 0.7),
                ],
            ),
            preset(
                "rumble-filter",
                "Steep low cut for handling noise",
                &[(ParamId::LowCutFreq, 80.0), (ParamId::LowCutSlope, 2.0)],
            ),
            preset(
                "presence",
                "Gentle upper-mid lift",
                &[
                    (ParamId::PeakFreq, 4000.0),
                    (ParamId::PeakGain, 3.0),
                    (ParamId::PeakQuality, 0.8),
                ],
            ),
        ]
    }

    /// Load a preset from a TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading preset");

        let contents = fs::read_to_string(path).await?;
        let preset: Self = toml::from_str(&contents)?;

        debug!(name = %preset.name, "Preset loaded successfully");
        Ok(preset)
    }

    /// Save a preset to a TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving preset");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Preset saved successfully");
        Ok(())
    }
}

/// Preset manager
pub struct PresetManager {
    preset_dir: PathBuf,
}

impl PresetManager {
    /// Create a new preset manager
    pub fn new(preset_dir: PathBuf) -> Self {
        Self { preset_dir }
    }

    /// Platform preset directory (`~/.config/eqtrain/presets` on Linux)
    pub fn default_preset_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("eqtrain").join("presets"))
            .ok_or_else(|| {
                ConfigError::Invalid("Could not determine config directory".to_string())
            })
    }

    pub fn preset_dir(&self) -> &Path {
        &self.preset_dir
    }

    fn preset_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.contains(|c: char| c == '/' || c == '\\')
            || name.starts_with('.')
        {
            return Err(ConfigError::Invalid(format!("invalid preset name: {name:?}")));
        }
        Ok(self.preset_dir.join(format!("{}.toml", name)))
    }

    /// List all available presets
    #[instrument(skip(self))]
    pub async fn list_presets(&self) -> Result<Vec<String>> {
        let mut presets = Vec::new();

        let mut entries = match fs::read_dir(&self.preset_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(presets),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "toml").unwrap_or(false) {
                if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                    presets.push(name.to_string());
                }
            }
        }

        presets.sort();
        debug!(count = presets.len(), "Listed presets");
        Ok(presets)
    }

    /// Load a preset by name
    #[instrument(skip(self))]
    pub async fn load_preset(&self, name: &str) -> Result<EqPreset> {
        let path = self.preset_path(name)?;

        if !path.exists() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }

        EqPreset::load_from_file(&path).await
    }

    /// Save a preset under its own name
    #[instrument(skip(self, preset))]
    pub async fn save_preset(&self, preset: &EqPreset) -> Result<()> {
        let path = self.preset_path(&preset.name)?;
        preset.save_to_file(&path).await
    }

    /// Delete a preset by name
    #[instrument(skip(self))]
    pub async fn delete_preset(&self, name: &str) -> Result<()> {
        let path = self.preset_path(name)?;

        if !path.exists() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }

        fs::remove_file(&path).await?;
        info!(name, "Preset deleted");
        Ok(())
    }

    /// Check if a preset exists
    pub async fn preset_exists(&self, name: &str) -> bool {
        self.preset_path(name).map(|p| p.exists()).unwrap_or(false)
    }
}

/// Settings for the command-line front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sample rate the processor is prepared with
    pub sample_rate: f64,

    /// Maximum block size in frames
    pub block_size: usize,

    /// Preset directory, the platform config directory unless overridden
    pub preset_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            preset_dir: PresetManager::default_preset_dir()
                .unwrap_or_else(|_| PathBuf::from("presets")),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be non-zero".to_string()));
        }
        Ok(())
    }
}

//! Configuration file management for vocalviz.
//!
//! The configuration lives in `~/.config/vocalviz/vocalviz.toml`. A missing
//! file is created with default values on first load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::FilterParameters;

/// Audio output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `vocalviz list-devices`
    /// - device name from `vocalviz list-devices`
    #[serde(default = "default_device")]
    pub device: String,
}

fn default_device() -> String {
    "default".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

/// Waveform display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Draw the waveform bands; playback works either way
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
    /// Vocal filter chain tuning, written by the calibration panel
    #[serde(default)]
    pub filters: FilterParameters,
}

impl VizConfig {
    /// Loads configuration from the user's config directory, writing the
    /// defaults there first if no file exists yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&config_path()?)
    }

    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default configuration at {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: VizConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".config").join("vocalviz").join("vocalviz.toml"))
}

/// Persists new filter parameters.
///
/// The other settings keep their values, but the file is rewritten from the
/// parsed config, so comments and custom formatting are lost.
pub fn save_filters(filters: FilterParameters) -> Result<()> {
    save_filters_to(&config_path()?, filters)
}

fn save_filters_to(path: &Path, filters: FilterParameters) -> Result<()> {
    let mut config = VizConfig::load_or_default_from(path)?;
    config.filters = filters;
    config.save_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vocalviz-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("vocalviz.toml")
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let path = temp_config("missing");
        let config = VizConfig::load_or_default_from(&path).unwrap();
        assert_eq!(config, VizConfig::default());
        assert!(path.exists());
        assert_eq!(VizConfig::load_or_default_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_config("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[audio]\ndevice = \"2\"\n\n[filters]\nvocal_gain = 5.0\n").unwrap();

        let config = VizConfig::load_or_default_from(&path).unwrap();
        assert_eq!(config.audio.device, "2");
        assert!(config.visualization.enabled);
        assert_eq!(config.filters.vocal_gain, 5.0);
        assert_eq!(
            config.filters.highpass_freq,
            FilterParameters::default().highpass_freq
        );
    }

    #[test]
    fn test_save_round_trips_filters() {
        let path = temp_config("save");
        let mut config = VizConfig::default();
        config.filters.peaking_freq = 1200.0;
        config.visualization.enabled = false;
        config.save_to(&path).unwrap();

        let loaded = VizConfig::load_or_default_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_filters_keeps_other_settings() {
        let path = temp_config("filters");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[audio]\ndevice = \"3\"\n\n[visualization]\nenabled = false\n").unwrap();

        let filters = FilterParameters {
            vocal_gain: 7.5,
            ..FilterParameters::default()
        };
        save_filters_to(&path, filters).unwrap();

        let loaded = VizConfig::load_or_default_from(&path).unwrap();
        assert_eq!(loaded.audio.device, "3");
        assert!(!loaded.visualization.enabled);
        assert_eq!(loaded.filters, filters);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_config("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[audio\n").unwrap();
        assert!(VizConfig::load_or_default_from(&path).is_err());
    }
}

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "triband";
const SETTINGS_FILENAME: &str = "settings.json";

impl std::fmt::Display for AudioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Input Left Port: {}", self.input_left_port)?;
        writeln!(f, "Input Right Port: {}", self.input_right_port)?;
        writeln!(f, "Output Left Port: {}", self.output_left_port)?;
        writeln!(f, "Output Right Port: {}", self.output_right_port)?;
        writeln!(f, "Buffer Size: {}", self.buffer_size)?;
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub input_left_port: String,
    pub input_right_port: String,
    pub output_left_port: String,
    pub output_right_port: String,
    pub buffer_size: u32,
    pub sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            input_left_port: "system:capture_1".to_string(),
            input_right_port: "system:capture_2".to_string(),
            output_left_port: "system:playback_1".to_string(),
            output_right_port: "system:playback_2".to_string(),
            buffer_size: 256,
            sample_rate: 48000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub preset_dir: String,
    pub selected_preset: Option<String>,
    /// How often the host polls and logs the band meters.
    pub meter_refresh_ms: u64,
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "------------------------------")?;

        writeln!(f, "Audio Settings:")?;
        writeln!(f, "{}", self.audio)?;

        writeln!(f, "Settings:")?;
        writeln!(f, "Preset Directory: {}", self.preset_dir)?;
        writeln!(
            f,
            "Selected Preset: {}",
            self.selected_preset.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Meter Refresh: {} ms", self.meter_refresh_ms)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: AudioSettings::default(),
            preset_dir: "./presets".to_string(),
            selected_preset: None,
            meter_refresh_ms: 100,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_settings_path())
    }

    pub fn load_from(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            let contents =
                fs::read_to_string(settings_path).context("Failed to read settings file")?;
            let settings: Self =
                serde_json::from_str(&contents).context("Failed to parse settings")?;
            debug!("Loaded settings from {}", settings_path.display());
            Ok(settings)
        } else {
            info!("No settings file found, using defaults");
            let settings = Self::default();
            if let Err(e) = settings.save_to(settings_path) {
                warn!("Failed to write default settings: {e:#}");
            }
            Ok(settings)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_settings_path())
    }

    pub fn save_to(&self, settings_path: &Path) -> Result<()> {
        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(settings_path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {}", settings_path.display());
        Ok(())
    }

    pub fn get_settings_path() -> PathBuf {
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join(APP_DIR)
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join(APP_DIR)
                .join(SETTINGS_FILENAME)
        } else {
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }

    /// Point PipeWire's JACK layer at the configured latency.
    pub fn apply_to_environment(&self) {
        unsafe {
            std::env::set_var("PIPEWIRE_LATENCY", self.get_pipewire_latency());
            if std::env::var("JACK_PROMISCUOUS_SERVER").is_err() {
                std::env::set_var("JACK_PROMISCUOUS_SERVER", "pipewire");
            }
        }
    }

    fn get_pipewire_latency(&self) -> String {
        format!("{}/{}", self.audio.buffer_size, self.audio.sample_rate)
    }
}

use super::Preset;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::params::Snapshot;

/// Preset files in one directory, one JSON file per preset.
pub struct Manager {
    presets_dir: PathBuf,
    presets: Vec<Preset>,
}

impl Manager {
    pub fn new(preset_dir: impl AsRef<Path>) -> Result<Self> {
        let presets_dir = preset_dir.as_ref().to_path_buf();
        fs::create_dir_all(&presets_dir).context("Failed to create presets directory")?;

        let mut manager = Self {
            presets_dir,
            presets: Vec::new(),
        };
        manager.load_presets()?;

        Ok(manager)
    }

    /// Rescan the directory. Files that fail to parse are skipped.
    pub fn load_presets(&mut self) -> Result<()> {
        self.presets.clear();

        if !self.presets_dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.presets_dir).context("Failed to read presets directory")? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match load_preset_file(&path) {
                Ok(preset) => self.presets.push(preset),
                Err(e) => warn!("Failed to load preset {}: {e:#}", path.display()),
            }
        }

        self.presets.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            "Loaded {} preset(s) from {}",
            self.presets.len(),
            self.presets_dir.display()
        );
        Ok(())
    }

    pub fn save_preset(&mut self, preset: &Preset) -> Result<()> {
        if preset.name.trim().is_empty() {
            bail!("Preset name must not be empty");
        }
        let path = self.preset_path(&preset.name);
        let json = serde_json::to_string_pretty(preset).context("Failed to serialize preset")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write preset file {}", path.display()))?;

        self.load_presets()
    }

    /// Store the given values under `name`, replacing any preset of that name.
    pub fn save_snapshot(&mut self, name: &str, snapshot: &Snapshot) -> Result<()> {
        self.save_preset(&Preset::from_snapshot(name.to_string(), snapshot))
    }

    pub fn delete_preset(&mut self, preset_name: &str) -> Result<()> {
        let path = self.preset_path(preset_name);
        if !path.exists() {
            bail!("Preset file not found: {preset_name}");
        }
        fs::remove_file(&path).context("Failed to delete preset file")?;
        self.load_presets()
    }

    pub fn preset_exists(&self, name: &str) -> bool {
        self.presets.iter().any(|p| p.name == name)
    }

    pub fn get_presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get_preset_by_name(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn presets_dir(&self) -> &Path {
        &self.presets_dir
    }

    fn preset_path(&self, name: &str) -> PathBuf {
        self.presets_dir
            .join(format!("{}.json", sanitize_filename(name)))
    }
}

/// Read a single preset file from anywhere on disk.
pub fn load_preset_file(path: impl AsRef<Path>) -> Result<Preset> {
    let content = fs::read_to_string(path.as_ref()).context("Failed to read preset file")?;
    serde_json::from_str(&content).context("Failed to parse preset JSON")
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Band, ParamId};

    #[test]
    fn save_list_and_delete() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut manager = Manager::new(dir.path())?;
        assert!(manager.get_presets().is_empty());

        let mut snapshot = Snapshot::default();
        snapshot.set(ParamId::InputGain, 3.0);
        manager.save_snapshot("Drum Bus", &snapshot)?;
        manager.save_snapshot("Acoustic", &Snapshot::default())?;

        let names: Vec<_> = manager.get_presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Acoustic", "Drum Bus"]);
        assert!(dir.path().join("Drum_Bus.json").exists());

        let loaded = manager
            .get_preset_by_name("Drum Bus")
            .map(Preset::to_snapshot);
        assert_eq!(loaded, Some(snapshot));

        manager.delete_preset("Drum Bus")?;
        assert!(!manager.preset_exists("Drum Bus"));
        assert!(manager.delete_preset("Drum Bus").is_err());
        Ok(())
    }

    #[test]
    fn broken_files_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("broken.json"), "{ not json")?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut preset = Preset::default();
        preset.name = "Gentle".to_string();
        preset.values.insert(Band::Low.keys().ratio.key().to_string(), 2.0);
        fs::write(
            dir.path().join("gentle.json"),
            serde_json::to_string(&preset)?,
        )?;

        let manager = Manager::new(dir.path())?;
        assert_eq!(manager.get_presets().len(), 1);
        assert!(manager.preset_exists("Gentle"));
        Ok(())
    }

    #[test]
    fn rejects_empty_names() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut manager = Manager::new(dir.path())?;
        assert!(manager.save_snapshot("  ", &Snapshot::default()).is_err());
        Ok(())
    }

    #[test]
    fn sanitizes_filenames() {
        assert_eq!(sanitize_filename("Vocal Bus #2"), "Vocal_Bus__2");
        assert_eq!(sanitize_filename("../escape"), "___escape");
    }
}

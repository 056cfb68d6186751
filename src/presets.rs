use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::settings::{Boundary, Settings, SpawnRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named set of simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: Settings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Built-in presets plus any user presets found on disk
pub struct PresetManager {
    pub builtin: Vec<Preset>,
    pub user: Vec<Preset>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    pub fn new() -> Self {
        let mut manager = Self::builtin_only();
        if let Some(dir) = Self::presets_dir() {
            manager.load_user_presets(&dir);
        }
        manager
    }

    pub fn builtin_only() -> Self {
        Self {
            builtin: Self::builtin_presets(),
            user: Vec::new(),
        }
    }

    fn builtin_presets() -> Vec<Preset> {
        vec![
            Preset::new("Classic", "100 grains, threshold 4, 100ms steps", Settings::default()),
            Preset::new(
                "Avalanche",
                "A large pile stepped quickly",
                Settings {
                    initial_grains: 20_000,
                    point_size: 2,
                    step_delay_ms: 10,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Instant",
                "Run straight to the stable pile",
                Settings {
                    initial_grains: 5_000,
                    point_size: 2,
                    step_delay_ms: 0,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Monochrome",
                "Every cell in one color",
                Settings {
                    adaptive_color: false,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Uniform",
                "New neighbors receive threshold/4 like existing ones",
                Settings {
                    initial_grains: 2_000,
                    spawn_rule: SpawnRule::Share,
                    point_size: 2,
                    step_delay_ms: 20,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Walled",
                "Grains leaving the grid are lost at the exact edge",
                Settings {
                    initial_grains: 50_000,
                    boundary: Boundary::Strict,
                    point_size: 2,
                    step_delay_ms: 0,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Heavy",
                "Threshold 8 with a wider color ramp",
                Settings {
                    initial_grains: 4_000,
                    threshold: 8,
                    adaptive_color_offset: 0x30,
                    step_delay_ms: 20,
                    ..Default::default()
                },
            ),
        ]
    }

    /// `<config dir>/sandpile-sim/presets`
    fn presets_dir() -> Option<PathBuf> {
        AppConfig::config_dir().map(|p| p.join("presets"))
    }

    /// Load every `*.json` preset in `dir`, skipping unreadable files
    pub fn load_user_presets(&mut self, dir: &Path) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str::<Preset>(&content).map_err(|e| e.to_string()))
            {
                Ok(preset) => self.user.push(preset),
                Err(err) => log::warn!("skipping preset {}: {}", path.display(), err),
            }
        }
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Result<&Preset, ConfigError> {
        self.all_presets()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_are_valid() {
        let manager = PresetManager::builtin_only();
        assert!(!manager.builtin.is_empty());
        for preset in manager.all_presets() {
            assert!(preset.settings.validate().is_ok(), "{} is invalid", preset.name);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let manager = PresetManager::builtin_only();
        assert_eq!(manager.find("classic").unwrap().settings, Settings::default());
        assert_eq!(manager.find("INSTANT").unwrap().settings.step_delay_ms, 0);
        assert!(matches!(manager.find("nope"), Err(ConfigError::UnknownPreset(_))));
    }

    #[test]
    fn test_load_user_presets() {
        let dir = tempfile::tempdir().unwrap();
        let preset = Preset::new(
            "Mine",
            "custom",
            Settings {
                threshold: 12,
                ..Default::default()
            },
        );
        fs::write(dir.path().join("mine.json"), serde_json::to_string(&preset).unwrap()).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut manager = PresetManager::builtin_only();
        manager.load_user_presets(dir.path());

        assert_eq!(manager.user.len(), 1);
        assert_eq!(manager.find("mine").unwrap().settings.threshold, 12);
        assert_eq!(manager.all_presets().count(), manager.builtin.len() + 1);
    }
}

//! User settings persistence.
//!
//! Settings are stored as JSON in the user's config directory
//! (e.g., `~/.config/photo-booth/settings.json` on Linux).

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Image-capable Gemini models offered in the settings panel.
pub const AVAILABLE_MODELS: &[&str] = &[
    "gemini-2.5-flash-image",
    "gemini-2.5-flash-image-preview",
    "gemini-3-pro-image-preview",
];

/// User-configurable settings persisted between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Selected Gemini model name.
    pub model: String,
    /// API key override (takes precedence over environment).
    #[serde(default)]
    pub api_key: String,
}

impl Settings {
    /// Returns the path to the settings file.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "enie", "photo-booth")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from disk, falling back to defaults if not found.
    ///
    /// # Arguments
    /// * `default_model` - The model to use if no settings file exists.
    pub fn load(default_model: &str) -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path, default_model),
            None => Self::with_defaults(default_model),
        }
    }

    pub fn load_from(path: &Path, default_model: &str) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    tracing::warn!(?err, ?path, "failed to parse settings; using defaults");
                    None
                }
            })
            .unwrap_or_else(|| Self::with_defaults(default_model))
    }

    /// Creates default settings with the specified model.
    pub fn with_defaults(model: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key: String::new(),
        }
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Whether a key is available; the environment key is copied in at startup.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults(crate::config::DEFAULT_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"), "m");
        assert_eq!(settings, Settings::with_defaults("m"));
        assert!(!settings.has_api_key());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = Settings {
            model: AVAILABLE_MODELS[1].to_string(),
            api_key: "secret".into(),
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path, "other"), settings);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").unwrap();
        assert_eq!(Settings::load_from(&path, "m").model, "m");
    }
}

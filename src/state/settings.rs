use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_PROXY_BASE_URL;
use crate::core::paths::resolve_config_relative;

/// Default settings file name, looked up next to the executable.
pub const SETTINGS_FILE: &str = "showcase.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Showcase page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseSettings {
    /// Base address of the duration proxy.
    #[serde(default = "default_proxy_base_url")]
    pub proxy_base_url: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionSettings>,
}

/// One video with its timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSettings {
    /// Suffix shared by the section's element ids, e.g. `1-1`.
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Event table; relative paths are taken from the settings file's folder.
    pub csv_path: PathBuf,
    /// Embed address of the player, including its `bvid`.
    pub player_url: String,
    /// Which page of a multi-part video to take the duration from.
    #[serde(default)]
    pub page_index: usize,
}

fn default_proxy_base_url() -> String {
    DEFAULT_PROXY_BASE_URL.to_string()
}

fn default_title() -> String {
    "Floor timeline".to_string()
}

impl Default for ShowcaseSettings {
    fn default() -> Self {
        Self {
            proxy_base_url: default_proxy_base_url(),
            title: default_title(),
            sections: Vec::new(),
        }
    }
}

impl ShowcaseSettings {
    /// Load from `path`; section CSV paths are resolved against its folder.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let mut settings: ShowcaseSettings = serde_json::from_str(&json)?;
        for section in &mut settings.sections {
            section.csv_path = resolve_config_relative(path, &section.csv_path);
        }
        Ok(settings)
    }

    /// Like [`ShowcaseSettings::load`] but never fails: a missing or broken
    /// file yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                tracing::info!(
                    path = %path.display(),
                    sections = settings.sections.len(),
                    "loaded settings"
                );
                settings
            }
            Err(SettingsError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings");
                Self::default()
            }
        }
    }
}

impl SectionSettings {
    /// Element id of the section's player iframe.
    pub fn player_id(&self) -> String {
        format!("video{}", self.id)
    }

    pub fn container_id(&self) -> String {
        format!("timeline-container{}", self.id)
    }
}

//! Settings shared with the rest of the mapping tool suite.
//!
//! The settings file is owned by the launcher and carries keys this crate
//! does not model. It is never written from here; every tool keeps its own
//! read-only [`SettingsSnapshot`] and re-reads the file when it changes.

use crate::error::Result;
use crate::material::DEFAULT_MATERIAL_FOLDER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Directory name of the tool suite under the system temp dir.
pub const APP_DIR_NAME: &str = ".CS2KZ-mapping-tools";

/// Settings relevant to skybox conversion. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Any path inside the CS2 install (used to find addons).
    pub cs2_path: Option<PathBuf>,
    /// Location of VTFCmd.exe.
    pub vtfcmd_path: Option<PathBuf>,
    /// Time limit for one external decode, in seconds.
    pub decode_timeout_secs: u64,
    /// Engine-relative folder the atlas is referenced from.
    pub material_folder: String,
    pub create_skybox_vmat: bool,
    pub create_moondome_vmat: bool,
    /// UI theme name; carried through for the launcher.
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cs2_path: None,
            vtfcmd_path: None,
            decode_timeout_secs: 60,
            material_folder: DEFAULT_MATERIAL_FOLDER.to_string(),
            create_skybox_vmat: false,
            create_moondome_vmat: false,
            theme: "system".to_string(),
        }
    }
}

impl Settings {
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_secs(self.decode_timeout_secs.max(1))
    }

    /// Parse settings JSON, filling missing keys with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Default settings file location.
pub fn default_settings_path() -> PathBuf {
    std::env::temp_dir().join(APP_DIR_NAME).join("settings.json")
}

/// A read-only copy of the settings file.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    path: PathBuf,
    settings: Settings,
    modified: Option<SystemTime>,
}

impl SettingsSnapshot {
    /// Load the file at `path`. A missing or corrupt file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let modified = modified_time(&path);
        let settings = read_or_default(&path);
        Self {
            path,
            settings,
            modified,
        }
    }

    /// Snapshot of in-memory settings, not tied to a file.
    pub fn fixed(settings: Settings) -> Self {
        Self {
            path: PathBuf::new(),
            settings,
            modified: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file if its modification time changed.
    ///
    /// Returns `true` when the snapshot was replaced.
    pub fn refresh(&mut self) -> bool {
        if self.path.as_os_str().is_empty() {
            return false;
        }
        let modified = modified_time(&self.path);
        if modified == self.modified {
            return false;
        }
        self.modified = modified;
        let settings = read_or_default(&self.path);
        let changed = settings != self.settings;
        self.settings = settings;
        if changed {
            log::debug!("Reloaded settings from {}", self.path.display());
        }
        changed
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_or_default(path: &Path) -> Settings {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(_) => return Settings::default(),
    };
    match Settings::from_json(&json) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Error loading settings from {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

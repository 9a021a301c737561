// Persisted application state: window placement and the key of the last
// open document, stored as one TOML file under the user data dir.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "Richpad";
const APPLICATION: &str = "richpad";
const STATE_FILE_NAME: &str = "state.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        WindowGeometry {
            x: 100,
            y: 100,
            width: 760,
            height: 520,
        }
    }
}

impl WindowGeometry {
    /// Reject degenerate sizes a crashed or minimized session may have left
    pub fn is_usable(&self) -> bool {
        self.width > 200 && self.height > 150
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub window: WindowGeometry,
    /// Key of the document that was open when the app closed
    #[serde(default)]
    pub last_key: Option<String>,
}

impl AppState {
    /// Load from the default location. Missing or unreadable state falls
    /// back to the defaults; unreadable files are reported on stderr.
    pub fn load() -> Self {
        let Some(path) = state_file_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(state) => state,
            Err(err) => {
                eprintln!("{err}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
        toml::from_str(&contents)
            .map_err(|err| format!("Failed to parse {}: {}", path.display(), err))
    }

    pub fn save(&self) -> Result<(), String> {
        let path = state_file_path().ok_or_else(|| "No user data directory".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {}", parent.display(), err))?;
        }
        let toml = toml::to_string_pretty(self)
            .map_err(|err| format!("Failed to serialize state: {err}"))?;
        fs::write(path, toml)
            .map_err(|err| format!("Failed to write {}: {}", path.display(), err))
    }
}

pub fn state_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.data_local_dir().join(STATE_FILE_NAME))
}

/// Default directory for stored document snapshots
pub fn default_storage_dir() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.data_local_dir().join("documents"))
}

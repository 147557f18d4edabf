use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted for the API key when no flag is given.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Optional overrides read from `<config_dir>/video-summary/settings.json`.
///
/// Every field may be omitted; command-line flags take precedence over the
/// file, and built-in defaults apply to whatever neither sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub interval_seconds: Option<f64>,
    pub max_width: Option<u32>,
    pub quality: Option<u8>,
    pub max_tokens: Option<u32>,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("video-summary").join("settings.json"))
    }

    /// Loads the user settings file. A missing file yields defaults; an
    /// unreadable or malformed one is an error so typos are not silently
    /// ignored.
    pub fn load() -> Result<Self, String> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings file {}: {e}", path.display()))?;
        serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings file {}: {e}", path.display()))
    }

    /// Picks the API key from the flag, then the environment, then the file.
    pub fn resolve_api_key(
        &self,
        flag: Option<&str>,
        env: Option<String>,
    ) -> Result<String, String> {
        flag.map(str::to_string)
            .or(env)
            .or_else(|| self.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                format!(
                    "No API key found. Pass --api-key, set {API_KEY_ENV}, or add \"api_key\" to {}",
                    Self::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "the settings file".to_string())
                )
            })
    }
}

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub sync: SyncConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Forward pointer-made range selections to the engine as visual selections.
    pub mouse_selection_forwarding: bool,
    pub jump_function: String,
    #[serde(default = "default_visual_key")]
    pub visual_key: String,
    #[serde(default = "default_mouse_button")]
    pub mouse_button: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mouse_selection_forwarding: false,
            jump_function: "CursorlinkStoreJump".to_string(),
            visual_key: default_visual_key(),
            mouse_button: default_mouse_button(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "cursorlink=info".to_string(),
        }
    }
}

fn default_visual_key() -> String {
    "v".to_string()
}

fn default_mouse_button() -> String {
    "left".to_string()
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut config = Self::defaults()?;

        if let Some(path) = Self::user_config_path()
            && path.exists()
        {
            config = Self::from_file(&path)?; // full replace, no deep merge
        }

        Ok(config)
    }

    pub fn defaults() -> Result<Self> {
        Self::from_toml_str(include_str!("../../config/default.toml"))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cursorlink")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_defaults_parse() {
        let config = AppConfig::defaults().unwrap();
        assert!(!config.sync.mouse_selection_forwarding);
        assert_eq!(config.sync.visual_key, "v");
        assert_eq!(config.log.filter, "cursorlink=info");
    }

    #[test]
    fn user_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sync]\nmouse_selection_forwarding = true\njump_function = \"Jump\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.sync.mouse_selection_forwarding);
        assert_eq!(config.sync.jump_function, "Jump");
        assert_eq!(config.sync.mouse_button, "left");
        assert_eq!(config.log.filter, "cursorlink=info");
    }

    #[test]
    fn missing_sync_section_is_an_error() {
        assert!(AppConfig::from_toml_str("[log]\nfilter = \"debug\"").is_err());
    }
}

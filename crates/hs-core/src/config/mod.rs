//! Settings management for Homestead
//!
//! Settings are the tool's own knobs (where state lives, defaults offered at
//! prompts). They are distinct from the key/value [`ConfigStore`](crate::store::ConfigStore),
//! which records what the operator answered.

mod settings;

pub use settings::{
    ContainerSettings, DeploymentSettings, KeyBackend, PathSettings, PreflightSettings, Settings,
    WireGuardSettings,
};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homestead")
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.toml")
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}

/// Load settings from a file
pub fn load_settings<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read settings: {}", e)))?;

    let settings: T = toml::from_str(&content)?;
    Ok(settings)
}

/// Save settings to a file
pub fn save_settings<T: serde::Serialize>(path: &Path, settings: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(settings)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create settings dir: {}", e)))?;
    }

    crate::fsutil::atomic_write(path, content.as_bytes(), 0o644)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write settings: {}", e)))?;

    Ok(())
}

/// Load settings from `path`, or from the default location when present
///
/// A missing default file is not an error; an explicitly named one is.
pub fn resolve_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    match path {
        Some(path) => load_settings(path),
        None => {
            let default_path = default_settings_path();
            if default_path.exists() {
                load_settings(&default_path)
            } else {
                tracing::debug!("No settings file at {:?}, using defaults", default_path);
                Ok(Settings::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_home() {
        let expanded = expand_home(Path::new("~/state"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("state"));
        }
        assert_eq!(expand_home(Path::new("/etc/wireguard")), PathBuf::from("/etc/wireguard"));
    }

    #[test]
    fn test_load_missing_settings() {
        let dir = TempDir::new().unwrap();
        let err = load_settings::<Settings>(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_and_load_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.wireguard.listen_port = 51999;
        settings.preflight.required_commands = vec!["ip".into()];
        save_settings(&path, &settings).unwrap();

        let loaded: Settings = load_settings(&path).unwrap();
        assert_eq!(loaded.wireguard.listen_port, 51999);
        assert_eq!(loaded.preflight.required_commands, vec!["ip".to_string()]);
    }

    #[test]
    fn test_resolve_explicit_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_settings(Some(&dir.path().join("nope.toml"))).is_err());
    }
}

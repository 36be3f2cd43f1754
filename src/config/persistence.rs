//! Settings file persistence
//!
//! Loading and saving the settings file to a platform-specific config
//! directory with graceful fallback to defaults.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the config directory
const APP_NAME: &str = "graphite";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Backup configuration file name (used during atomic writes)
const CONFIG_BACKUP_NAME: &str = "config.json.bak";

/// Environment variable overriding the config directory (used by tests and
/// scripted setups).
const CONFIG_DIR_ENV: &str = "GRAPHITE_CONFIG_DIR";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the config directory.
///
/// `GRAPHITE_CONFIG_DIR` wins when set; otherwise the platform config
/// directory (e.g. `~/.config/graphite/` on Linux) is used.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::DataDirNotFound)
}

/// Get the full path to the configuration file.
pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists, creating it if necessary.
fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;

    if !config_dir.exists() {
        debug!("Creating config directory: {}", config_dir.display());
        fs::create_dir_all(&config_dir).map_err(|e| Error::StoreSave {
            path: config_dir.clone(),
            source: Box::new(e),
        })?;
    }

    Ok(config_dir)
}

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from the default config file location.
///
/// A missing, empty, or corrupted file falls back to defaults; settings are
/// never a reason to refuse to start.
pub fn load_config() -> Settings {
    load_config_internal()
        .unwrap_or_warn_default(Settings::default(), "Failed to load configuration")
}

fn load_config_internal() -> Result<Settings> {
    let config_path = get_config_file_path()?;

    if !config_path.exists() {
        debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        return Ok(Settings::default());
    }

    debug!("Loading config from: {}", config_path.display());

    let contents = fs::read_to_string(&config_path).map_err(|e| Error::StoreLoad {
        path: config_path.clone(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Config file is empty, using defaults");
        return Ok(Settings::default());
    }

    let settings: Settings = serde_json::from_str(&contents)?;
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Save Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Save settings to the default config file location.
///
/// Atomic write: serialize to a backup file first, then rename over the
/// config file.
pub fn save_config(settings: &Settings) -> Result<()> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let backup_path = config_dir.join(CONFIG_BACKUP_NAME);

    debug!("Saving config to: {}", config_path.display());

    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::StoreSave {
        path: config_path.clone(),
        source: Box::new(e),
    })?;

    fs::write(&backup_path, &json).map_err(|e| Error::StoreSave {
        path: backup_path.clone(),
        source: Box::new(e),
    })?;

    fs::rename(&backup_path, &config_path).map_err(|e| Error::StoreSave {
        path: config_path.clone(),
        source: Box::new(e),
    })?;

    Ok(())
}

/// Save settings, ignoring errors.
///
/// Best-effort saves (e.g. after a theme toggle) must not interrupt the
/// application flow.
///
/// # Returns
///
/// Returns `true` if the save was successful, `false` otherwise.
pub fn save_config_silent(settings: &Settings) -> bool {
    match save_config(settings) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save configuration: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_constants() {
        assert_eq!(CONFIG_FILE_NAME, "config.json");
        assert_eq!(APP_NAME, "graphite");
    }

    #[test]
    fn test_saved_config_is_valid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);

        let settings = Settings { theme: Theme::Light };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        fs::write(&path, &json).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[test]
    fn test_corrupted_config_fails_parse() {
        let result: std::result::Result<Settings, _> = serde_json::from_str("{ invalid json }");
        assert!(result.is_err());
    }

    #[test]
    fn test_null_theme_fails_parse() {
        let result: std::result::Result<Settings, _> = serde_json::from_str(r#"{"theme": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_graceful_fallback() {
        // The public API always returns usable settings.
        let settings = load_config();
        let _ = settings.theme;
    }
}

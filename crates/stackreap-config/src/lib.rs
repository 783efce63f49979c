pub mod error;
pub mod metadata;
pub mod settings;

pub use error::*;
pub use metadata::{ClusterMetadata, OpenStackMetadata};
pub use settings::{ClusterSettings, RetrySection, RetrySettings, Settings, WorkerSettings};

use std::path::{Path, PathBuf};

/// Get the stackreap config directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stackreap");

    Ok(config_dir)
}

/// Locate the settings file
///
/// Search order:
/// 1. `STACKREAP_CONFIG` environment variable (direct path)
/// 2. current directory: stackreap.yaml, .stackreap.yaml
/// 3. ~/.config/stackreap/config.yaml
///
/// Returns `None` when no file exists; the defaults apply then.
pub fn find_settings_file() -> Result<Option<PathBuf>> {
    // 1. direct path from the environment
    if let Ok(config_path) = std::env::var("STACKREAP_CONFIG") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 2. current directory
    let current_dir = std::env::current_dir()?;
    for filename in ["stackreap.yaml", ".stackreap.yaml"] {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. user-wide settings
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("stackreap").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Parse a settings file
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidSettings {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Discover and load settings, falling back to defaults
pub fn load_settings() -> Result<Settings> {
    match find_settings_file()? {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading settings");
            load_settings_from(&path)
        }
        None => Ok(Settings::default()),
    }
}

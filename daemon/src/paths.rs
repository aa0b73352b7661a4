/// Canonical file paths for Gamelight data files.
///
/// The config file lives under the platform config directory:
///   - Windows: %APPDATA%\Gamelight\config.toml
///   - Linux:   $XDG_CONFIG_HOME/Gamelight/config.toml
use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR_NAME: &str = "Gamelight";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the Gamelight configuration directory.
pub fn app_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Platform config directory not found")?;
    Ok(base.join(APP_DIR_NAME))
}

/// Returns the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join(CONFIG_FILE_NAME))
}

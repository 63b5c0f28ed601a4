//! Application configuration.
//!
//! A small TOML file under the user config directory. Missing file means
//! defaults; a malformed file is an error the caller reports. The datetime
//! inference threshold is deliberately not configurable.

use std::path::{Path, PathBuf};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::loader::Delimiter;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default field delimiter for delimited text.
    pub delimiter: Delimiter,
    /// Default heatmap palette name.
    pub palette: String,
    /// Categories shown before truncation in categorical analysis.
    pub top_categories: usize,
    /// Bin count for numeric histograms.
    pub histogram_bins: usize,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            palette: "coolwarm".to_string(),
            top_categories: 20,
            histogram_bins: 20,
            chart_width: 900,
            chart_height: 600,
        }
    }
}

/// Manages the config directory and the config file.
#[derive(Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load(&self) -> Result<AppConfig> {
        let path = self.config_file();
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&text)
            .map_err(|e| eyre!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Write the given config, creating the directory if needed.
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        let text = toml::to_string_pretty(config)
            .map_err(|e| eyre!("could not serialize config: {}", e))?;
        std::fs::write(self.config_file(), text)?;
        Ok(())
    }

    /// Default configuration as a TOML string, for `--generate-config`.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&AppConfig::default())
            .expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        let config = manager.load().unwrap();
        assert_eq!(config.top_categories, 20);
        assert_eq!(config.palette, "coolwarm");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        let config = AppConfig {
            delimiter: Delimiter::Semicolon,
            palette: "viridis".to_string(),
            top_categories: 10,
            histogram_bins: 15,
            chart_width: 640,
            chart_height: 480,
        };
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.palette, "viridis");
        assert_eq!(loaded.delimiter, Delimiter::Semicolon);
        assert_eq!(loaded.top_categories, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_dir(dir.path().to_path_buf());
        std::fs::create_dir_all(manager.config_dir()).unwrap();
        std::fs::write(manager.config_file(), "not [valid toml").unwrap();
        assert!(manager.load().is_err());
    }

    #[test]
    fn test_generate_default_config_parses() {
        let text = ConfigManager::generate_default_config();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.histogram_bins, AppConfig::default().histogram_bins);
    }
}

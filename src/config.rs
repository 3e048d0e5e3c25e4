//! Configuration file handling for the dashboard.
//!
//! The configuration file is optional. When `--config` (or `SALES_DASHBOARD_CONFIG`) is not given,
//! `<config dir>/sales-dashboard/config.json` is used if it exists, and built-in defaults
//! otherwise.
//! A configuration file that was named explicitly must exist.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "sales-dashboard";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const DEFAULT_SOURCE: &str = "archive/dataset.csv";
const DEFAULT_TITLE: &str = "Business Sales Dashboard";
const DEFAULT_PREVIEW_ROWS: usize = 10;
const DEFAULT_OUTPUT: &str = "dashboard.html";

/// The settings of the app.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "sales-dashboard",
///   "config_version": 1,
///   "default_source": "archive/dataset.csv",
///   "title": "Business Sales Dashboard",
///   "preview_rows": 10,
///   "output": "dashboard.html"
/// }
/// ```
///
/// Only `app_name` and `config_version` are required; every other field falls back to its default.
/// Relative paths are resolved against the working directory.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Application name, should always be "sales-dashboard"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The dataset that is loaded when no file has been uploaded
    #[serde(default = "default_source")]
    default_source: PathBuf,

    /// The heading of the dashboard page
    #[serde(default = "default_title")]
    title: String,

    /// The number of rows shown in the preview table
    #[serde(default = "default_preview_rows")]
    preview_rows: usize,

    /// Where the HTML page is written
    #[serde(default = "default_output")]
    output: PathBuf,

    /// The file this configuration was loaded from, if any
    #[serde(skip)]
    path: Option<PathBuf>,
}

fn default_source() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE)
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_source: default_source(),
            title: default_title(),
            preview_rows: default_preview_rows(),
            output: default_output(),
            path: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// # Arguments
    /// - `path` - An explicitly requested configuration file. When `None`, the default location is
    ///   tried and defaults are used if nothing is there.
    ///
    /// # Errors
    /// - `ErrorType::Config` if an explicitly requested file is missing, or if any file that is
    ///   read cannot be parsed or has the wrong `app_name`.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(anyhow!("The config file is missing '{}'", path.display()))
                        .pub_result(ErrorType::Config);
                }
                Self::load_file(path).await.pub_result(ErrorType::Config)
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => {
                    Self::load_file(&path).await.pub_result(ErrorType::Config)
                }
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    async fn load_file(path: &Path) -> Res<Self> {
        let mut config: Config = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.preview_rows > 0,
            "Invalid preview_rows in config file: must be at least 1"
        );

        debug!("Loaded config from {}", path.display());
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Saves the configuration to `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self)
            .context("Unable to serialize config")
            .pub_result(ErrorType::Config)?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
            .pub_result(ErrorType::Config)
    }

    /// `<config dir>/sales-dashboard/config.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_JSON))
    }

    /// The file this configuration was loaded from. `None` for built-in defaults.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_source(&self) -> &Path {
        &self.default_source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn with_default_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_source = path.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_source(), Path::new("archive/dataset.csv"));
        assert_eq!(config.title(), "Business Sales Dashboard");
        assert_eq!(config.preview_rows(), 10);
        assert_eq!(config.output(), Path::new("dashboard.html"));
        assert!(config.path().is_none());
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original = Config::default()
            .with_title("Cafe")
            .with_default_source("/data/cafe.csv");
        original.save(&config_path).await.unwrap();

        let loaded = Config::load(Some(&config_path)).await.unwrap();
        assert_eq!(loaded.title(), "Cafe");
        assert_eq!(loaded.default_source(), Path::new("/data/cafe.csv"));
        assert_eq!(loaded.path(), Some(config_path.as_path()));
    }

    #[tokio::test]
    async fn test_config_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "sales-dashboard",
            "config_version": 1,
            "preview_rows": 3
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = Config::load(Some(&config_path)).await.unwrap();
        assert_eq!(config.preview_rows(), 3);
        assert_eq!(config.default_source(), Path::new(DEFAULT_SOURCE));
        assert_eq!(config.output(), Path::new(DEFAULT_OUTPUT));
    }

    #[tokio::test]
    async fn test_config_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "wrong_app", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = Config::load(Some(&config_path)).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_load_zero_preview_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "sales-dashboard", "config_version": 1, "preview_rows": 0 }"#;
        utils::write(&config_path, json).await.unwrap();

        let err = Config::load(Some(&config_path)).await.unwrap_err();
        assert!(err.to_string().contains("preview_rows"));
    }

    #[tokio::test]
    async fn test_config_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(Some(&temp_dir.path().join("nope.json")))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_config_default_path() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("sales-dashboard/config.json"));
        }
    }
}

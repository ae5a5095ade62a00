use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DATABASE_ENV: &str = "WEATHER_DB";
pub const LISTEN_ADDR_ENV: &str = "WEATHER_ADDR";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DATABASE_FILE: &str = "weather-data.sqlite";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// database_path = "/var/lib/weather/weather-data.sqlite"
/// listen_addr = "0.0.0.0:8080"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// SQLite file holding searches and snapshots.
    pub database_path: Option<PathBuf>,

    /// Address the HTTP API binds to.
    pub listen_addr: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        prefer_env(env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    /// Database location: environment, then config file, then the platform data dir.
    pub fn database_path(&self) -> Result<PathBuf> {
        let configured = self.database_path.as_ref().and_then(|p| p.to_str());
        if let Some(path) = prefer_env(env::var(DATABASE_ENV).ok(), configured) {
            return Ok(PathBuf::from(path));
        }

        let dirs = project_dirs()?;
        let data_dir = dirs.data_dir();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    pub fn listen_addr(&self) -> String {
        prefer_env(env::var(LISTEN_ADDR_ENV).ok(), self.listen_addr.as_deref())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-task", "weather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

/// Non-empty environment value wins over the configured one.
fn prefer_env(env_value: Option<String>, configured: Option<&str>) -> Option<String> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("OPEN_KEY".into());
        cfg.database_path = Some(PathBuf::from("/tmp/weather.sqlite"));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn environment_overrides_config() {
        assert_eq!(prefer_env(Some("ENV".into()), Some("FILE")), Some("ENV".to_string()));
        assert_eq!(prefer_env(Some("  ".into()), Some("FILE")), Some("FILE".to_string()));
        assert_eq!(prefer_env(None, Some("FILE")), Some("FILE".to_string()));
        assert_eq!(prefer_env(None, None), None);
    }
}

use std::path::PathBuf;

use tsupgrade_common::{Error, Result};

use crate::model::AppConfig;

/// Overrides `database.url`.
pub const DATABASE_URL_ENV: &str = "TSUPGRADE_DATABASE_URL";
/// Overrides `install.scripts_dir`.
pub const INSTALL_DIR_ENV: &str = "TSUPGRADE_INSTALL_DIR";

const CONFIG_FILES: [&str; 2] = ["config.yml", "config.toml"];

/// Builds the effective [`AppConfig`]: defaults, then the config file, then
/// the `TSUPGRADE_*` environment variables.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Uses `<config dir>/tsupgrade` when it exists, else `~/.tsupgrade`.
    pub fn new() -> Self {
        Self {
            config_dir: default_config_dir(),
        }
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// The file `load` reads, if any. YAML wins when both are present.
    pub fn config_file(&self) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }

    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    fn load_with_env(&self, env: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
        let mut config = self.read_file()?;

        if let Some(url) = env(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
            config.database.url = url;
        }
        if let Some(dir) = env(INSTALL_DIR_ENV).filter(|v| !v.is_empty()) {
            config.install.scripts_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    fn read_file(&self) -> Result<AppConfig> {
        let Some(path) = self.config_file() else {
            return Ok(AppConfig::default());
        };

        let contents = std::fs::read_to_string(&path)?;
        let parsed = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&contents).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&contents).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn default_config_dir() -> PathBuf {
    let xdg = dirs::config_dir().map(|c| c.join("tsupgrade"));
    let home = dirs::home_dir().map(|h| h.join(".tsupgrade"));

    let existing = [&xdg, &home]
        .into_iter()
        .flatten()
        .find(|dir| dir.exists())
        .cloned();
    existing
        .or(xdg)
        .or(home)
        .unwrap_or_else(|| PathBuf::from(".tsupgrade"))
}

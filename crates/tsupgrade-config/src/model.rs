use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub upgrade: UpgradeConfig,

    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            install: InstallConfig::default(),
            upgrade: UpgradeConfig::default(),
            log_level: Some("info".to_string()),
        }
    }
}

/// Connection settings for the timeseries database being upgraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
        }
    }
}

fn default_url() -> String {
    "sqlite://tsupgrade.db".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Root of the install scripts tree; upgrade files live under `<scripts_dir>/upgrade/<version>/`.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
        }
    }
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("install")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Wrap all steps and cleanup actions in one transaction instead of
    /// letting every routine call commit on its own.
    #[serde(default)]
    pub single_transaction: bool,

    /// Abort when the routine definition file cannot be loaded. Off by
    /// default: a failed load is logged and the upgrade carries on.
    #[serde(default)]
    pub strict_routine_load: bool,
}

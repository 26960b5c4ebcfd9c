pub mod loader;
pub mod model;

pub use loader::{ConfigLoader, DATABASE_URL_ENV, INSTALL_DIR_ENV};
pub use model::{AppConfig, DatabaseConfig, InstallConfig, UpgradeConfig};

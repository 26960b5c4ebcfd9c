pub mod connection;
pub mod loader;
pub mod plan;
pub mod sqlite;
pub mod upgrade;

#[cfg(test)]
mod testing;

pub use connection::{Connector, UpgradeConnection};
pub use loader::{RoutineLoad, RoutineLoader, definition_path};
pub use plan::{CleanupAction, MIGRATION_PLANS, MigrationPlan, Step, supported_versions};
pub use sqlite::{SqliteConnection, SqliteConnector};
pub use upgrade::{
    TsDatabaseUpgradeService, UpgradeOutcome, UpgradeReport, check_version, execute_steps,
    run_cleanup,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tsupgrade_common::{Error, Result, SchemaVersion};
use tsupgrade_config::UpgradeConfig;

use crate::connection::{Connector, UpgradeConnection};
use crate::loader::{RoutineLoad, RoutineLoader};
use crate::plan::{CleanupAction, MigrationPlan, Step};

/// How an upgrade run ended when it did not fail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpgradeOutcome {
    Upgraded(UpgradeReport),
    /// The engine is too old; nothing past routine loading was touched.
    PreconditionNotMet { routines: RoutineLoad },
}

#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub from_version: SchemaVersion,
    pub target_version: SchemaVersion,
    pub routines: RoutineLoad,
    pub steps_executed: usize,
    pub cleanup_actions: usize,
    pub single_transaction: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Upgrades the timeseries tables of one database from a known source version.
pub struct TsDatabaseUpgradeService<C> {
    connector: C,
    loader: RoutineLoader,
    settings: UpgradeConfig,
}

impl<C: Connector> TsDatabaseUpgradeService<C> {
    pub fn new(connector: C, scripts_dir: impl Into<PathBuf>, settings: UpgradeConfig) -> Self {
        Self {
            connector,
            loader: RoutineLoader::new(scripts_dir),
            settings,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Runs the plan registered for `from_version`.
    ///
    /// An unknown version fails before any connection is opened. The
    /// connection opened for a known version is closed on every return path.
    pub fn upgrade(&self, from_version: &str) -> Result<UpgradeOutcome> {
        let plan = MigrationPlan::find(from_version)
            .ok_or_else(|| Error::UnsupportedVersion(from_version.to_string()))?;

        let mut conn = self.connector.connect()?;
        info!(
            "updating timeseries schema from {} to {}",
            plan.from_version, plan.target_version
        );
        self.run_plan(&mut conn, plan)
    }

    fn run_plan(&self, conn: &mut C::Connection, plan: &MigrationPlan) -> Result<UpgradeOutcome> {
        let started_at = Utc::now();

        let routines = self.loader.load(conn, plan);
        if let RoutineLoad::Degraded { reason, .. } = &routines {
            if self.settings.strict_routine_load {
                return Err(Error::RoutineLoad(reason.clone()));
            }
        }

        if !check_version(conn, plan.check_routine) {
            info!("database engine version is below the minimum required by this upgrade");
            info!("please upgrade the database engine and restart the upgrade");
            return Ok(UpgradeOutcome::PreconditionNotMet { routines });
        }
        info!("database engine version is valid");
        info!("updating schema ...");

        if self.settings.single_transaction {
            conn.begin()?;
            if let Err(e) = apply_plan(conn, plan) {
                if let Err(rollback_err) = conn.rollback() {
                    error!("failed to roll back upgrade transaction: {rollback_err}");
                }
                return Err(e);
            }
            conn.commit()?;
        } else {
            apply_plan(conn, plan)?;
        }

        info!("timeseries schema updated");
        Ok(UpgradeOutcome::Upgraded(UpgradeReport {
            from_version: SchemaVersion::from(plan.from_version),
            target_version: SchemaVersion::from(plan.target_version),
            routines,
            steps_executed: plan.steps.len(),
            cleanup_actions: plan.cleanup.len(),
            single_transaction: self.settings.single_transaction,
            started_at,
            finished_at: Utc::now(),
        }))
    }
}

fn apply_plan<C: UpgradeConnection + ?Sized>(conn: &mut C, plan: &MigrationPlan) -> Result<()> {
    execute_steps(conn, plan.steps)?;
    run_cleanup(conn, plan.cleanup)
}

/// Asks the installed check routine whether the engine is recent enough.
/// A routine that cannot be run counts as a failed check.
pub fn check_version<C: UpgradeConnection + ?Sized>(conn: &mut C, routine: &str) -> bool {
    info!("checking the current database engine version...");
    match conn.query_flag(routine) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("failed to check current database engine version due to: {e}");
            false
        }
    }
}

/// Invokes each step in order, stopping at the first failure.
pub fn execute_steps<C: UpgradeConnection + ?Sized>(conn: &mut C, steps: &[Step]) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        info!("{} ...", step.invocation);
        if let Err(e) = conn.call_routine(step.name) {
            error!("failed to execute function {} due to: {e}", step.invocation);
            return Err(Error::Step {
                index: i + 1,
                invocation: step.invocation.to_string(),
                message: e.to_string(),
            });
        }
        info!("successfully executed function {}", step.invocation);
    }
    Ok(())
}

/// Drops obsolete objects and applies the closing DDL, stopping at the first failure.
pub fn run_cleanup<C: UpgradeConnection + ?Sized>(
    conn: &mut C,
    actions: &[CleanupAction],
) -> Result<()> {
    for (i, action) in actions.iter().enumerate() {
        let result = match action {
            CleanupAction::DropTable(_) | CleanupAction::Execute(_) => {
                conn.execute(&action.statement())
            }
            CleanupAction::DropRoutine(routine) => conn.drop_routine(routine),
        };

        let statement = action.statement();
        match result {
            Ok(()) => info!("successfully executed statement: {statement}"),
            Err(e) => {
                error!("failed to execute statement: {statement} due to: {e}");
                return Err(Error::Cleanup {
                    index: i + 1,
                    statement,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

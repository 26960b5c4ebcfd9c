//! Fixed upgrade plans, keyed by the schema version they upgrade from.
//!
//! Each plan names the routines it installs, the order they run in and the
//! cleanup that follows. Supporting a new source version means adding an
//! entry to [`MIGRATION_PLANS`]; the dispatcher does not change.

use serde::Serialize;

/// One routine invocation inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Name of the installed routine.
    pub name: &'static str,
    /// Call expression shown in logs and step errors.
    pub invocation: &'static str,
}

macro_rules! step {
    ($name:literal) => {
        Step {
            name: $name,
            invocation: concat!("CALL ", $name, "()"),
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum CleanupAction {
    DropTable(&'static str),
    DropRoutine(&'static str),
    Execute(&'static str),
}

impl CleanupAction {
    /// SQL text describing the action, used in logs and error messages.
    pub fn statement(&self) -> String {
        match self {
            Self::DropTable(table) => format!("DROP TABLE {table}"),
            Self::DropRoutine(routine) => format!("DROP ROUTINE IF EXISTS {routine}"),
            Self::Execute(sql) => (*sql).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MigrationPlan {
    pub from_version: &'static str,
    pub target_version: &'static str,
    /// Directory under `upgrade/` holding the routine definition file.
    pub script_dir: &'static str,
    /// Routine answering whether the database engine is recent enough.
    pub check_routine: &'static str,
    pub steps: &'static [Step],
    pub cleanup: &'static [CleanupAction],
}

impl MigrationPlan {
    /// Exact match on the version string; no normalisation is applied.
    pub fn find(from_version: &str) -> Option<&'static MigrationPlan> {
        MIGRATION_PLANS
            .iter()
            .find(|plan| plan.from_version == from_version)
    }

    /// Every routine the definition file is expected to install.
    pub fn routines(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.check_routine).chain(self.steps.iter().map(|s| s.name))
    }
}

pub fn supported_versions() -> impl Iterator<Item = &'static str> {
    MIGRATION_PLANS.iter().map(|plan| plan.from_version)
}

const CHECK_VERSION: &str = "check_version";

const TS_KV_PARTITIONING_STEPS: &[Step] = &[
    step!("create_partition_ts_kv_table"),
    step!("create_partitions"),
    step!("create_ts_kv_dictionary_table"),
    step!("insert_into_dictionary"),
    step!("insert_into_ts_kv"),
    step!("create_new_ts_kv_latest_table"),
    step!("insert_into_ts_kv_latest"),
];

const TS_KV_PARTITIONING_CLEANUP: &[CleanupAction] = &[
    CleanupAction::DropTable("ts_kv_old"),
    CleanupAction::DropTable("ts_kv_latest_old"),
    CleanupAction::DropRoutine(CHECK_VERSION),
    CleanupAction::DropRoutine("create_partition_ts_kv_table"),
    CleanupAction::DropRoutine("create_partitions"),
    CleanupAction::DropRoutine("create_ts_kv_dictionary_table"),
    CleanupAction::DropRoutine("insert_into_dictionary"),
    CleanupAction::DropRoutine("insert_into_ts_kv"),
    CleanupAction::DropRoutine("create_new_ts_kv_latest_table"),
    CleanupAction::DropRoutine("insert_into_ts_kv_latest"),
    CleanupAction::Execute("ALTER TABLE ts_kv ADD COLUMN json_v json"),
    CleanupAction::Execute("ALTER TABLE ts_kv_latest ADD COLUMN json_v json"),
];

pub const MIGRATION_PLANS: &[MigrationPlan] = &[MigrationPlan {
    from_version: "12.2.0.1",
    target_version: "2.5.0",
    script_dir: "12.2.0.1",
    check_routine: CHECK_VERSION,
    steps: TS_KV_PARTITIONING_STEPS,
    cleanup: TS_KV_PARTITIONING_CLEANUP,
}];

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::connection::UpgradeConnection;
use crate::plan::MigrationPlan;

/// Location of the routine definition file for `version` in `dialect`.
pub fn definition_path(scripts_dir: &Path, version: &str, dialect: &str) -> PathBuf {
    scripts_dir
        .join("upgrade")
        .join(version)
        .join(format!("schema_update_{dialect}_ts.sql"))
}

/// Result of installing a plan's routines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoutineLoad {
    Installed { path: PathBuf },
    Degraded { path: PathBuf, reason: String },
}

impl RoutineLoad {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Installs upgrade routines from the install scripts tree.
pub struct RoutineLoader {
    scripts_dir: PathBuf,
}

impl RoutineLoader {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Reads the definition file and runs it against `conn`.
    ///
    /// Never fails: an unreadable file or a script error is reported as
    /// [`RoutineLoad::Degraded`] and the caller decides what to do with it.
    pub fn load<C: UpgradeConnection + ?Sized>(
        &self,
        conn: &mut C,
        plan: &MigrationPlan,
    ) -> RoutineLoad {
        let path = definition_path(&self.scripts_dir, plan.script_dir, conn.dialect());
        info!("loading upgrade functions from {}", path.display());

        let script = match std::fs::read_to_string(&path) {
            Ok(script) => script,
            Err(e) => {
                warn!("failed to load upgrade functions due to: {e}");
                let reason = format!("failed to read {}: {e}", path_name(&path));
                return RoutineLoad::Degraded { path, reason };
            }
        };

        match conn.execute_script(&script) {
            Ok(()) => {
                info!("upgrade functions successfully loaded");
                RoutineLoad::Installed { path }
            }
            Err(e) => {
                warn!("failed to load upgrade functions due to: {e}");
                RoutineLoad::Degraded {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn path_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingConnection;

    #[test]
    fn definition_path_follows_install_layout() {
        let path = definition_path(Path::new("/opt/tb/data"), "12.2.0.1", "sqlite");
        assert_eq!(
            path,
            PathBuf::from("/opt/tb/data/upgrade/12.2.0.1/schema_update_sqlite_ts.sql")
        );
    }

    #[test]
    fn load_runs_file_contents_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let plan = MigrationPlan::find("12.2.0.1").unwrap();
        let path = definition_path(dir.path(), "12.2.0.1", "fake");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "-- routines\nSELECT 1;").unwrap();

        let mut conn = RecordingConnection::default();
        let load = RoutineLoader::new(dir.path()).load(&mut conn, plan);

        assert_eq!(load, RoutineLoad::Installed { path });
        assert_eq!(conn.calls(), vec!["script: -- routines\nSELECT 1;"]);
    }

    #[test]
    fn missing_file_degrades_without_touching_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let plan = MigrationPlan::find("12.2.0.1").unwrap();

        let mut conn = RecordingConnection::default();
        let load = RoutineLoader::new(dir.path()).load(&mut conn, plan);

        match load {
            RoutineLoad::Degraded { path, reason } => {
                assert_eq!(path, definition_path(dir.path(), "12.2.0.1", "fake"));
                assert!(reason.starts_with("failed to read schema_update_fake_ts.sql"));
            }
            other => panic!("expected degraded load, got {other:?}"),
        }
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn script_error_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let plan = MigrationPlan::find("12.2.0.1").unwrap();
        let path = definition_path(dir.path(), "12.2.0.1", "fake");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "CREATE TABLE broken (").unwrap();

        let mut conn = RecordingConnection::default().failing_on("script: CREATE TABLE broken (");
        match RoutineLoader::new(dir.path()).load(&mut conn, plan) {
            RoutineLoad::Degraded { reason, .. } => assert!(reason.contains("injected failure")),
            other => panic!("expected degraded load, got {other:?}"),
        }
    }
}

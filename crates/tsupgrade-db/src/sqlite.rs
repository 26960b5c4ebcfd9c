use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tsupgrade_common::{Error, Result};
use tsupgrade_config::DatabaseConfig;

use crate::connection::{Connector, UpgradeConnection};

/// Catalog table the definition script fills with `(name, body)` rows.
/// SQLite has no stored procedures, so a routine is a named SQL batch.
const ROUTINE_TABLE: &str = "upgrade_routine";

pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let path = parse_url(&config.url)?;
        if config.username.is_some() || config.password.is_some() {
            debug!("sqlite backend ignores database credentials");
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for SqliteConnector {
    type Connection = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnection::open(&self.path)
    }
}

/// Accepts `sqlite://<path>`, `sqlite:<path>` or a bare path.
fn parse_url(url: &str) -> Result<PathBuf> {
    let url = url.trim();
    let path = match url.strip_prefix("sqlite://") {
        Some(rest) => rest,
        None => match url.strip_prefix("sqlite:") {
            Some(rest) => rest,
            None if url.contains("://") => {
                return Err(Error::Config(format!(
                    "unsupported database url scheme: {url}"
                )));
            }
            None => url,
        },
    };

    if path.is_empty() {
        return Err(Error::Config(format!(
            "database url does not name a file: {url}"
        )));
    }
    Ok(PathBuf::from(path))
}

pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Opens an existing database file; a missing file is an error rather
    /// than a fresh empty database.
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening timeseries database at {}", db_path.display());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db_path, flags)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self { conn })
    }

    #[cfg(test)]
    fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Whether the definition script has created the routine catalog.
    fn has_catalog(&self) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![ROUTINE_TABLE],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .map_err(|e| Error::Database(format!("failed to inspect schema: {e}")))
    }

    fn routine_body(&self, name: &str) -> Result<String> {
        if !self.has_catalog()? {
            return Err(Error::RoutineNotFound(name.to_string()));
        }

        self.conn
            .query_row(
                &format!("SELECT body FROM {ROUTINE_TABLE} WHERE name = ?1"),
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to look up routine {name}: {e}")))?
            .ok_or_else(|| Error::RoutineNotFound(name.to_string()))
    }
}

impl UpgradeConnection for SqliteConnection {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    fn execute_script(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute(sql, [])
            .map(|_| ())
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn call_routine(&mut self, name: &str) -> Result<()> {
        let body = self.routine_body(name)?;
        self.conn
            .execute_batch(&body)
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn query_flag(&mut self, name: &str) -> Result<bool> {
        let body = self.routine_body(name)?;
        let flag: i64 = self
            .conn
            .query_row(&body, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(flag != 0)
    }

    fn drop_routine(&mut self, name: &str) -> Result<()> {
        if !self.has_catalog()? {
            return Ok(());
        }
        self.conn
            .execute(
                &format!("DELETE FROM {ROUTINE_TABLE} WHERE name = ?1"),
                params![name],
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        // Once the last routine is gone the catalog itself goes too.
        let remaining: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {ROUTINE_TABLE}"), [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        if remaining == 0 {
            self.conn
                .execute_batch(&format!("DROP TABLE {ROUTINE_TABLE};"))
                .map_err(|e| Error::Database(e.to_string()))?;
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN;")
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT;")
            .map_err(|e| Error::Database(format!("failed to commit transaction: {e}")))
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK;")
            .map_err(|e| Error::Database(format!("failed to roll back transaction: {e}")))
    }
}

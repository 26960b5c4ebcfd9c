use tsupgrade_common::Result;

/// A live session against the database being upgraded.
///
/// The session is owned by a single upgrade run and closed when dropped.
/// Routines are installed by running a definition script and are invoked
/// by name without arguments.
pub trait UpgradeConnection {
    /// Dialect tag used to pick the routine definition file, e.g. `sqlite`.
    fn dialect(&self) -> &'static str;

    /// Runs a multi-statement script verbatim.
    fn execute_script(&mut self, sql: &str) -> Result<()>;

    /// Runs a single statement.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Invokes an installed routine. Fails with `Error::RoutineNotFound`
    /// when nothing by that name is installed.
    fn call_routine(&mut self, name: &str) -> Result<()>;

    /// Invokes an installed routine that answers with a single boolean.
    fn query_flag(&mut self, name: &str) -> Result<bool>;

    /// Removes an installed routine. Dropping a missing routine is not an error.
    fn drop_routine(&mut self, name: &str) -> Result<()>;

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
}

/// Opens connections for an upgrade run.
pub trait Connector {
    type Connection: UpgradeConnection;

    fn connect(&self) -> Result<Self::Connection>;
}

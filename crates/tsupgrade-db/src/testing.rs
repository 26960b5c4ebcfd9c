//! In-memory connection that records every call, for ordering tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tsupgrade_common::{Error, Result};

use crate::connection::{Connector, UpgradeConnection};

type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Clone)]
pub struct RecordingConnection {
    journal: Journal,
    fail_on: Option<String>,
    version_ok: bool,
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self {
            journal: Journal::default(),
            fail_on: None,
            version_ok: true,
        }
    }
}

impl RecordingConnection {
    /// Fail the first call whose journal entry equals `entry`.
    pub fn failing_on(mut self, entry: impl Into<String>) -> Self {
        self.fail_on = Some(entry.into());
        self
    }

    pub fn with_version_ok(mut self, ok: bool) -> Self {
        self.version_ok = ok;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    fn record(&mut self, entry: String) -> Result<()> {
        let fail = self.fail_on.as_deref() == Some(entry.as_str());
        self.journal.borrow_mut().push(entry);
        if fail {
            return Err(Error::Database("injected failure".to_string()));
        }
        Ok(())
    }
}

impl UpgradeConnection for RecordingConnection {
    fn dialect(&self) -> &'static str {
        "fake"
    }

    fn execute_script(&mut self, sql: &str) -> Result<()> {
        self.record(format!("script: {sql}"))
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.record(format!("execute: {sql}"))
    }

    fn call_routine(&mut self, name: &str) -> Result<()> {
        self.record(format!("call: {name}"))
    }

    fn query_flag(&mut self, name: &str) -> Result<bool> {
        self.record(format!("flag: {name}"))?;
        Ok(self.version_ok)
    }

    fn drop_routine(&mut self, name: &str) -> Result<()> {
        self.record(format!("drop routine: {name}"))
    }

    fn begin(&mut self) -> Result<()> {
        self.record("begin".to_string())
    }

    fn commit(&mut self) -> Result<()> {
        self.record("commit".to_string())
    }

    fn rollback(&mut self) -> Result<()> {
        self.record("rollback".to_string())
    }
}

/// Hands out clones of one template connection and counts how often it was asked.
pub struct RecordingConnector {
    template: RecordingConnection,
    connects: Cell<usize>,
    released: Rc<Cell<usize>>,
}

impl RecordingConnector {
    pub fn new(template: RecordingConnection) -> Self {
        Self {
            template,
            connects: Cell::new(0),
            released: Rc::default(),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }

    pub fn calls(&self) -> Vec<String> {
        self.template.calls()
    }
}

pub struct TrackedConnection {
    inner: RecordingConnection,
    released: Rc<Cell<usize>>,
}

impl Drop for TrackedConnection {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

impl UpgradeConnection for TrackedConnection {
    fn dialect(&self) -> &'static str {
        self.inner.dialect()
    }

    fn execute_script(&mut self, sql: &str) -> Result<()> {
        self.inner.execute_script(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.inner.execute(sql)
    }

    fn call_routine(&mut self, name: &str) -> Result<()> {
        self.inner.call_routine(name)
    }

    fn query_flag(&mut self, name: &str) -> Result<bool> {
        self.inner.query_flag(name)
    }

    fn drop_routine(&mut self, name: &str) -> Result<()> {
        self.inner.drop_routine(name)
    }

    fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()
    }
}

impl Connector for RecordingConnector {
    type Connection = TrackedConnection;

    fn connect(&self) -> Result<TrackedConnection> {
        self.connects.set(self.connects.get() + 1);
        Ok(TrackedConnection {
            inner: self.template.clone(),
            released: Rc::clone(&self.released),
        })
    }
}

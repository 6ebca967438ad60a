//! In-memory driver and recording sink for tests and benchmarks.
//!
//! Enabled for this crate's own tests and, for downstream crates, with the
//! `test-utils` feature.

use std::any::Any;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::Level;

use crate::api::{
    CallableStatement, Capability, Connection, Driver, PreparedStatement, Properties, ResultSet,
    Savepoint, Statement, Wrapper,
};
use crate::error::{SqlError, SqlResult};
use crate::report::{Channel, LogSink, Record, TimingMarker};
use crate::value::{SqlType, SqlValue, StreamKind};

/// Owned copy of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub channel: Channel,
    pub level: Level,
    pub message: String,
    pub marker: Option<TimingMarker>,
    pub error: Option<SqlError>,
}

/// [`LogSink`] keeping every record in memory.
///
/// Every channel starts disabled. A channel set to `level` accepts records
/// at `level` and anything more severe.
#[derive(Debug, Default)]
pub struct RecordingSink {
    levels: HashMap<Channel, Level>,
    records: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, channel: Channel, level: Level) -> Self {
        self.levels.insert(channel, level);
        self
    }

    #[must_use]
    pub fn with_all(mut self, level: Level) -> Self {
        for channel in Channel::ALL {
            self.levels.insert(channel, level);
        }
        self
    }

    pub fn records(&self) -> Vec<RecordedEvent> {
        self.records.lock().clone()
    }

    pub fn records_for(&self, channel: Channel) -> Vec<RecordedEvent> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.channel == channel)
            .cloned()
            .collect()
    }

    pub fn messages(&self, channel: Channel) -> Vec<String> {
        self.records_for(channel)
            .into_iter()
            .map(|record| record.message)
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for RecordingSink {
    fn enabled(&self, channel: Channel, level: Level) -> bool {
        // `tracing` orders more verbose levels as greater.
        self.levels.get(&channel).is_some_and(|max| level <= *max)
    }

    fn log(&self, record: &Record<'_>) {
        self.records.lock().push(RecordedEvent {
            channel: record.channel,
            level: record.level,
            message: record.message.to_owned(),
            marker: record.marker.cloned(),
            error: record.error.cloned(),
        });
    }
}

/// Behaviour shared by every handle a [`MemoryDriver`] hands out.
#[derive(Debug, Default)]
struct Script {
    failures: Vec<(String, SqlError)>,
    bind_failure: Option<(usize, SqlError)>,
    close_failure: Option<SqlError>,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    delay: Option<Duration>,
    decline: bool,
    executed: Vec<String>,
    bound: Vec<(usize, SqlValue)>,
}

impl Script {
    fn failure_for(&self, sql: &str) -> Option<SqlError> {
        self.failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, error)| error.clone())
    }
}

type SharedScript = Arc<Mutex<Script>>;

fn run(script: &SharedScript, sql: &str) -> SqlResult<()> {
    let delay = {
        let mut script = script.lock();
        if let Some(error) = script.failure_for(sql) {
            return Err(error);
        }
        script.executed.push(sql.to_owned());
        script.delay
    };
    if let Some(delay) = delay {
        std::thread::sleep(delay);
    }
    Ok(())
}

fn is_query(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

/// Driver for `mem:` URLs whose handles follow a shared script.
///
/// Clones share the script, so a test can keep one clone to inspect what
/// reached the driver after handing another to the proxy.
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    name: String,
    script: SharedScript,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Driver reporting `name`, which drives dialect selection.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::default(),
        }
    }

    /// Fail every execution whose SQL contains `pattern`.
    #[must_use]
    pub fn with_failure(self, pattern: impl Into<String>, error: SqlError) -> Self {
        self.script.lock().failures.push((pattern.into(), error));
        self
    }

    /// Fail binds at parameter `index`.
    #[must_use]
    pub fn with_bind_failure(self, index: usize, error: SqlError) -> Self {
        self.script.lock().bind_failure = Some((index, error));
        self
    }

    #[must_use]
    pub fn with_close_failure(self, error: SqlError) -> Self {
        self.script.lock().close_failure = Some(error);
        self
    }

    /// Rows returned by every query.
    #[must_use]
    pub fn with_rows(self, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        {
            let mut script = self.script.lock();
            script.columns = columns.iter().map(|c| (*c).to_owned()).collect();
            script.rows = rows;
        }
        self
    }

    /// Sleep this long in every execution.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.script.lock().delay = Some(delay);
        self
    }

    /// Accept `mem:` URLs but connect to nothing.
    #[must_use]
    pub fn declining(self) -> Self {
        self.script.lock().decline = true;
        self
    }

    /// SQL that reached the driver, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.script.lock().executed.clone()
    }

    /// Parameter binds that reached the driver.
    pub fn bound(&self) -> Vec<(usize, SqlValue)> {
        self.script.lock().bound.clone()
    }
}

impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("mem:")
    }

    fn connect(
        &self,
        url: &str,
        _properties: &Properties,
    ) -> SqlResult<Option<Box<dyn Connection>>> {
        if !self.accepts_url(url) || self.script.lock().decline {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryConnection {
            name: self.name.clone(),
            script: Arc::clone(&self.script),
            auto_commit: true,
            next_savepoint: 0,
            closed: false,
        })))
    }
}

#[derive(Debug)]
pub struct MemoryConnection {
    name: String,
    script: SharedScript,
    auto_commit: bool,
    next_savepoint: u64,
    closed: bool,
}

impl Wrapper for MemoryConnection {
    fn is_wrapper_for(&self, capability: &Capability) -> SqlResult<bool> {
        Ok(matches!(capability, Capability::Vendor(name) if name == "MemoryConnection"))
    }

    fn unwrap_for(&self, capability: &Capability) -> SqlResult<&dyn Any> {
        if self.is_wrapper_for(capability)? {
            Ok(self)
        } else {
            Err(SqlError::not_a_wrapper(capability))
        }
    }
}

impl Connection for MemoryConnection {
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>> {
        Ok(Box::new(MemoryStatement::new(&self.script, None)))
    }

    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>> {
        Ok(Box::new(MemoryStatement::new(&self.script, Some(sql))))
    }

    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>> {
        Ok(Box::new(MemoryStatement::new(&self.script, Some(sql))))
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> SqlResult<()> {
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn auto_commit(&self) -> SqlResult<bool> {
        Ok(self.auto_commit)
    }

    fn commit(&mut self) -> SqlResult<()> {
        run(&self.script, "COMMIT")
    }

    fn rollback(&mut self) -> SqlResult<()> {
        run(&self.script, "ROLLBACK")
    }

    fn set_savepoint(&mut self, name: Option<&str>) -> SqlResult<Savepoint> {
        self.next_savepoint += 1;
        Ok(Savepoint {
            id: self.next_savepoint,
            name: name.map(str::to_owned),
        })
    }

    fn driver_name(&self) -> SqlResult<String> {
        Ok(self.name.clone())
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        match self.script.lock().close_failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }
}

/// Statement of every kind: plain, prepared and callable.
#[derive(Debug)]
pub struct MemoryStatement {
    script: SharedScript,
    template: Option<String>,
    params: Vec<SqlValue>,
    batch: Vec<String>,
    pending: Option<MemoryResultSet>,
    update_count: Option<u64>,
    last_out_null: bool,
    closed: bool,
}

impl MemoryStatement {
    fn new(script: &SharedScript, template: Option<&str>) -> Self {
        Self {
            script: Arc::clone(script),
            template: template.map(str::to_owned),
            params: Vec::new(),
            batch: Vec::new(),
            pending: None,
            update_count: None,
            last_out_null: false,
            closed: false,
        }
    }

    fn rows(&self) -> MemoryResultSet {
        let script = self.script.lock();
        MemoryResultSet::new(script.columns.clone(), script.rows.clone())
    }

    fn template(&self) -> SqlResult<String> {
        self.template
            .clone()
            .ok_or_else(|| SqlError::database("statement has no prepared SQL"))
    }

    /// Valid indices run from 1 to the number of `?` in the template.
    fn check_index(&self, index: usize) -> SqlResult<()> {
        let placeholders = self
            .template
            .as_deref()
            .map_or(0, |sql| sql.matches('?').count());
        if index == 0 || index > placeholders {
            return Err(
                SqlError::database(format!("parameter index out of range: {index}"))
                    .with_sql_state("07009"),
            );
        }
        if let Some((failing, error)) = &self.script.lock().bind_failure
            && *failing == index
        {
            return Err(error.clone());
        }
        Ok(())
    }
}

impl Wrapper for MemoryStatement {}

impl Statement for MemoryStatement {
    fn execute(&mut self, sql: &str) -> SqlResult<bool> {
        run(&self.script, sql)?;
        if is_query(sql) {
            self.pending = Some(self.rows());
            self.update_count = None;
            Ok(true)
        } else {
            self.pending = None;
            self.update_count = Some(1);
            Ok(false)
        }
    }

    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>> {
        run(&self.script, sql)?;
        Ok(Box::new(self.rows()))
    }

    fn execute_update(&mut self, sql: &str) -> SqlResult<u64> {
        run(&self.script, sql)?;
        Ok(1)
    }

    fn add_batch(&mut self, sql: &str) -> SqlResult<()> {
        self.batch.push(sql.to_owned());
        Ok(())
    }

    fn clear_batch(&mut self) -> SqlResult<()> {
        self.batch.clear();
        Ok(())
    }

    fn execute_batch(&mut self) -> SqlResult<Vec<i64>> {
        let batch = std::mem::take(&mut self.batch);
        for sql in &batch {
            run(&self.script, sql)?;
        }
        Ok(vec![1; batch.len()])
    }

    fn result_set(&mut self) -> SqlResult<Option<Box<dyn ResultSet>>> {
        Ok(self
            .pending
            .take()
            .map(|rows| Box::new(rows) as Box<dyn ResultSet>))
    }

    fn update_count(&self) -> SqlResult<Option<u64>> {
        Ok(self.update_count)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }
}

impl PreparedStatement for MemoryStatement {
    fn set_value(&mut self, index: usize, value: SqlValue) -> SqlResult<()> {
        self.check_index(index)?;
        if self.params.len() < index {
            self.params.resize(index, SqlValue::Null);
        }
        self.params[index - 1] = value.clone();
        self.script.lock().bound.push((index, value));
        Ok(())
    }

    fn set_stream(
        &mut self,
        index: usize,
        kind: StreamKind,
        mut reader: Box<dyn Read + Send>,
        _length: Option<u64>,
    ) -> SqlResult<()> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| SqlError::database(format!("failed to read {kind} stream: {e}")))?;
        let value = match kind {
            StreamKind::Binary | StreamKind::Blob => SqlValue::Bytes(bytes),
            _ => SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
        };
        self.set_value(index, value)
    }

    fn clear_parameters(&mut self) -> SqlResult<()> {
        self.params.clear();
        Ok(())
    }

    fn execute_prepared(&mut self) -> SqlResult<bool> {
        let sql = self.template()?;
        self.execute(&sql)
    }

    fn execute_query_prepared(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        let sql = self.template()?;
        self.execute_query(&sql)
    }

    fn execute_update_prepared(&mut self) -> SqlResult<u64> {
        let sql = self.template()?;
        self.execute_update(&sql)
    }

    fn add_batch_prepared(&mut self) -> SqlResult<()> {
        let sql = self.template()?;
        self.batch.push(sql);
        Ok(())
    }
}

impl CallableStatement for MemoryStatement {
    fn register_out_parameter(&mut self, index: usize, _sql_type: SqlType) -> SqlResult<()> {
        self.check_index(index)?;
        if self.params.len() < index {
            self.params.resize(index, SqlValue::Null);
        }
        Ok(())
    }

    fn out_value(&mut self, index: usize) -> SqlResult<SqlValue> {
        let value = index
            .checked_sub(1)
            .and_then(|slot| self.params.get(slot))
            .cloned()
            .ok_or_else(|| SqlError::database(format!("no out parameter at index {index}")))?;
        self.last_out_null = value.is_null();
        Ok(value)
    }

    fn was_null(&self) -> SqlResult<bool> {
        Ok(self.last_out_null)
    }
}

/// Forward-only cursor over a fixed set of rows.
#[derive(Debug, Clone)]
pub struct MemoryResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    /// 0 is before the first row.
    position: usize,
    last_null: bool,
    closed: bool,
}

impl MemoryResultSet {
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows,
            position: 0,
            last_null: false,
            closed: false,
        }
    }
}

impl Wrapper for MemoryResultSet {}

impl ResultSet for MemoryResultSet {
    fn next(&mut self) -> SqlResult<bool> {
        if self.position <= self.rows.len() {
            self.position += 1;
        }
        Ok(self.position <= self.rows.len())
    }

    fn row(&self) -> SqlResult<u64> {
        if self.position <= self.rows.len() {
            Ok(self.position as u64)
        } else {
            Ok(0)
        }
    }

    fn get_value(&mut self, column: usize) -> SqlResult<SqlValue> {
        let row = self
            .position
            .checked_sub(1)
            .and_then(|index| self.rows.get(index))
            .ok_or_else(|| SqlError::database("cursor is not on a row"))?;
        let value = column
            .checked_sub(1)
            .and_then(|index| row.get(index))
            .cloned()
            .ok_or_else(|| SqlError::database(format!("column index out of range: {column}")))?;
        self.last_null = value.is_null();
        Ok(value)
    }

    fn find_column(&self, label: &str) -> SqlResult<usize> {
        self.columns
            .iter()
            .position(|name| name.eq_ignore_ascii_case(label))
            .map(|index| index + 1)
            .ok_or_else(|| SqlError::database(format!("unknown column: {label}")))
    }

    fn column_count(&self) -> SqlResult<usize> {
        Ok(self.columns.len())
    }

    fn was_null(&self) -> SqlResult<bool> {
        Ok(self.last_null)
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> SqlResult<bool> {
        Ok(self.closed)
    }
}

//! Driver contract.
//!
//! These traits describe what the proxy needs from a real database driver.
//! Driver adapters implement them, and the spy types in [`crate::spy`]
//! implement them as well, so a spy can stand in wherever the real handle
//! was used.
//!
//! Optional capabilities come with default bodies that fail with
//! [`SqlError::unsupported`]. A driver only overrides what it supports.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::time::Duration;

use crate::error::{SqlError, SqlResult};
use crate::value::{SqlType, SqlValue, StreamKind};

/// Connection properties passed through to the real driver.
pub type Properties = HashMap<String, String>;

/// Roles a handle can be queried for via [`Wrapper`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Connection,
    Statement,
    PreparedStatement,
    CallableStatement,
    ResultSet,
    /// Any handle produced by this crate's proxy layer.
    Spy,
    /// Driver specific interface, identified by name.
    Vendor(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => f.write_str("Connection"),
            Self::Statement => f.write_str("Statement"),
            Self::PreparedStatement => f.write_str("PreparedStatement"),
            Self::CallableStatement => f.write_str("CallableStatement"),
            Self::ResultSet => f.write_str("ResultSet"),
            Self::Spy => f.write_str("Spy"),
            Self::Vendor(name) => f.write_str(name),
        }
    }
}

/// Capability query and unwrap.
pub trait Wrapper {
    fn is_wrapper_for(&self, capability: &Capability) -> SqlResult<bool> {
        let _ = capability;
        Ok(false)
    }

    fn unwrap_for(&self, capability: &Capability) -> SqlResult<&dyn Any> {
        Err(SqlError::not_a_wrapper(capability))
    }
}

/// Entry point of a database driver.
pub trait Driver: Send + Sync {
    /// Name identifying the driver implementation, used for dialect selection.
    fn name(&self) -> &str;

    fn accepts_url(&self, url: &str) -> bool;

    /// Open a connection. `Ok(None)` means the URL is not for this driver.
    fn connect(&self, url: &str, properties: &Properties)
    -> SqlResult<Option<Box<dyn Connection>>>;
}

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::ReadUncommitted => "READ_UNCOMMITTED",
            Self::ReadCommitted => "READ_COMMITTED",
            Self::RepeatableRead => "REPEATABLE_READ",
            Self::Serializable => "SERIALIZABLE",
        })
    }
}

/// Savepoint handle returned by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savepoint {
    pub id: u64,
    pub name: Option<String>,
}

impl fmt::Display for Savepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Savepoint({name})"),
            None => write!(f, "Savepoint({})", self.id),
        }
    }
}

pub trait Connection: Wrapper + Send {
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>>;

    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>>;

    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>>;

    fn native_sql(&mut self, sql: &str) -> SqlResult<String> {
        Ok(sql.to_owned())
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> SqlResult<()>;

    fn auto_commit(&self) -> SqlResult<bool>;

    fn commit(&mut self) -> SqlResult<()>;

    fn rollback(&mut self) -> SqlResult<()>;

    fn set_savepoint(&mut self, name: Option<&str>) -> SqlResult<Savepoint> {
        let _ = name;
        Err(SqlError::unsupported("savepoints"))
    }

    fn rollback_to(&mut self, savepoint: &Savepoint) -> SqlResult<()> {
        let _ = savepoint;
        Err(SqlError::unsupported("savepoints"))
    }

    fn release_savepoint(&mut self, savepoint: &Savepoint) -> SqlResult<()> {
        let _ = savepoint;
        Err(SqlError::unsupported("savepoints"))
    }

    fn set_read_only(&mut self, read_only: bool) -> SqlResult<()> {
        let _ = read_only;
        Err(SqlError::unsupported("read-only connections"))
    }

    fn is_read_only(&self) -> SqlResult<bool> {
        Ok(false)
    }

    fn set_transaction_isolation(&mut self, level: IsolationLevel) -> SqlResult<()> {
        let _ = level;
        Err(SqlError::unsupported("transaction isolation"))
    }

    fn transaction_isolation(&self) -> SqlResult<IsolationLevel> {
        Err(SqlError::unsupported("transaction isolation"))
    }

    fn set_schema(&mut self, schema: &str) -> SqlResult<()> {
        let _ = schema;
        Err(SqlError::unsupported("schemas"))
    }

    fn schema(&self) -> SqlResult<Option<String>> {
        Ok(None)
    }

    fn is_valid(&mut self, timeout: Duration) -> SqlResult<bool> {
        let _ = timeout;
        self.is_closed().map(|closed| !closed)
    }

    fn warnings(&self) -> SqlResult<Option<String>> {
        Ok(None)
    }

    fn clear_warnings(&mut self) -> SqlResult<()> {
        Ok(())
    }

    /// Product or driver name reported through metadata.
    fn driver_name(&self) -> SqlResult<String> {
        Ok(String::new())
    }

    fn close(&mut self) -> SqlResult<()>;

    fn is_closed(&self) -> SqlResult<bool>;
}

pub trait Statement: Wrapper + Send {
    fn execute(&mut self, sql: &str) -> SqlResult<bool>;

    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>>;

    fn execute_update(&mut self, sql: &str) -> SqlResult<u64>;

    fn add_batch(&mut self, sql: &str) -> SqlResult<()> {
        let _ = sql;
        Err(SqlError::unsupported("batch updates"))
    }

    fn clear_batch(&mut self) -> SqlResult<()> {
        Err(SqlError::unsupported("batch updates"))
    }

    /// Execute queued commands, returning one update count per command.
    fn execute_batch(&mut self) -> SqlResult<Vec<i64>> {
        Err(SqlError::unsupported("batch updates"))
    }

    /// Result of the last `execute`, when it produced rows.
    fn result_set(&mut self) -> SqlResult<Option<Box<dyn ResultSet>>> {
        Ok(None)
    }

    fn update_count(&self) -> SqlResult<Option<u64>> {
        Ok(None)
    }

    fn more_results(&mut self) -> SqlResult<bool> {
        Ok(false)
    }

    fn generated_keys(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        Err(SqlError::unsupported("generated keys"))
    }

    fn set_max_rows(&mut self, max: u64) -> SqlResult<()> {
        let _ = max;
        Err(SqlError::unsupported("max rows"))
    }

    fn max_rows(&self) -> SqlResult<u64> {
        Ok(0)
    }

    fn set_query_timeout(&mut self, timeout: Duration) -> SqlResult<()> {
        let _ = timeout;
        Err(SqlError::unsupported("query timeout"))
    }

    fn query_timeout(&self) -> SqlResult<Duration> {
        Ok(Duration::ZERO)
    }

    fn set_fetch_size(&mut self, rows: u32) -> SqlResult<()> {
        let _ = rows;
        Ok(())
    }

    fn fetch_size(&self) -> SqlResult<u32> {
        Ok(0)
    }

    fn cancel(&mut self) -> SqlResult<()> {
        Err(SqlError::unsupported("cancel"))
    }

    fn warnings(&self) -> SqlResult<Option<String>> {
        Ok(None)
    }

    fn clear_warnings(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn close(&mut self) -> SqlResult<()>;

    fn is_closed(&self) -> SqlResult<bool>;
}

/// Statement with positional parameters. Indexes are 1-based.
pub trait PreparedStatement: Statement {
    fn set_value(&mut self, index: usize, value: SqlValue) -> SqlResult<()>;

    fn set_stream(
        &mut self,
        index: usize,
        kind: StreamKind,
        reader: Box<dyn Read + Send>,
        length: Option<u64>,
    ) -> SqlResult<()> {
        let _ = (index, reader, length);
        Err(SqlError::unsupported(format!("{kind} parameters")))
    }

    fn clear_parameters(&mut self) -> SqlResult<()>;

    fn execute_prepared(&mut self) -> SqlResult<bool>;

    fn execute_query_prepared(&mut self) -> SqlResult<Box<dyn ResultSet>>;

    fn execute_update_prepared(&mut self) -> SqlResult<u64>;

    /// Queue the current parameter set as one batch entry.
    fn add_batch_prepared(&mut self) -> SqlResult<()> {
        Err(SqlError::unsupported("batch updates"))
    }
}

/// Prepared statement calling a stored procedure.
pub trait CallableStatement: PreparedStatement {
    fn register_out_parameter(&mut self, index: usize, sql_type: SqlType) -> SqlResult<()>;

    fn register_out_parameter_named(&mut self, name: &str, sql_type: SqlType) -> SqlResult<()> {
        let _ = (name, sql_type);
        Err(SqlError::unsupported("named parameters"))
    }

    fn set_value_named(&mut self, name: &str, value: SqlValue) -> SqlResult<()> {
        let _ = (name, value);
        Err(SqlError::unsupported("named parameters"))
    }

    fn out_value(&mut self, index: usize) -> SqlResult<SqlValue>;

    fn out_value_named(&mut self, name: &str) -> SqlResult<SqlValue> {
        let _ = name;
        Err(SqlError::unsupported("named parameters"))
    }

    fn was_null(&self) -> SqlResult<bool>;
}

/// Cursor over query results. Column indexes are 1-based.
///
/// Scrolling methods default to "not supported", matching a forward-only cursor.
pub trait ResultSet: Wrapper + Send {
    fn next(&mut self) -> SqlResult<bool>;

    fn previous(&mut self) -> SqlResult<bool> {
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn first(&mut self) -> SqlResult<bool> {
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn last(&mut self) -> SqlResult<bool> {
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn before_first(&mut self) -> SqlResult<()> {
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn after_last(&mut self) -> SqlResult<()> {
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn absolute(&mut self, row: i64) -> SqlResult<bool> {
        let _ = row;
        Err(SqlError::unsupported("scrollable result sets"))
    }

    fn relative(&mut self, rows: i64) -> SqlResult<bool> {
        let _ = rows;
        Err(SqlError::unsupported("scrollable result sets"))
    }

    /// Current row number, 0 when not on a row.
    fn row(&self) -> SqlResult<u64> {
        Ok(0)
    }

    fn get_value(&mut self, column: usize) -> SqlResult<SqlValue>;

    fn get_value_by_label(&mut self, label: &str) -> SqlResult<SqlValue> {
        let column = self.find_column(label)?;
        self.get_value(column)
    }

    fn find_column(&self, label: &str) -> SqlResult<usize> {
        let _ = label;
        Err(SqlError::unsupported("column labels"))
    }

    fn column_count(&self) -> SqlResult<usize>;

    fn was_null(&self) -> SqlResult<bool>;

    fn set_fetch_size(&mut self, rows: u32) -> SqlResult<()> {
        let _ = rows;
        Ok(())
    }

    fn fetch_size(&self) -> SqlResult<u32> {
        Ok(0)
    }

    fn close(&mut self) -> SqlResult<()>;

    fn is_closed(&self) -> SqlResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Wrapper for Bare {}

    #[test]
    fn test_wrapper_defaults() {
        let bare = Bare;
        assert!(!bare.is_wrapper_for(&Capability::Connection).unwrap());
        let err = bare.unwrap_for(&Capability::Spy).unwrap_err();
        assert!(err.is_not_a_wrapper());
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::PreparedStatement.to_string(), "PreparedStatement");
        assert_eq!(Capability::Vendor("PgConnection".into()).to_string(), "PgConnection");
    }

    #[test]
    fn test_savepoint_display() {
        let named = Savepoint {
            id: 3,
            name: Some("before_update".into()),
        };
        assert_eq!(named.to_string(), "Savepoint(before_update)");
        let anonymous = Savepoint { id: 3, name: None };
        assert_eq!(anonymous.to_string(), "Savepoint(3)");
    }
}

//! Statement, prepared statement and callable statement spies.
//!
//! One generic [`StatementSpy`] serves all three roles. Parameter binding
//! and out parameter registration are extra trait impls that only apply
//! when the delegate supports them.

use std::any::Any;
use std::fmt::{self, Write};
use std::io::Read;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use super::{ResultSetSpy, SpyCore};
use crate::api::{
    CallableStatement, Capability, PreparedStatement, ResultSet, Statement, Wrapper,
};
use crate::error::SqlResult;
use crate::format::try_format;
use crate::registry::ActiveStatement;
use crate::report::ClassType;
use crate::trace::ArgumentTrace;
use crate::value::{SqlType, SqlValue, StreamKind};

/// Prefix of batch entries queued through a plain `add_batch(sql)`.
const STATEMENT_SQL_WARNING: &str = "{WARNING: Statement used to run SQL} ";

/// Spy over a prepared statement.
pub type PreparedStatementSpy = StatementSpy<dyn PreparedStatement>;
/// Spy over a callable statement.
pub type CallableStatementSpy = StatementSpy<dyn CallableStatement>;

/// SQL bookkeeping readable from the registry while the statement is in use.
#[derive(Debug)]
struct StatementState {
    template: Option<String>,
    trace: ArgumentTrace,
    last_sql: Mutex<Option<String>>,
}

impl ActiveStatement for StatementState {
    fn current_sql(&self) -> Option<String> {
        self.template
            .clone()
            .or_else(|| self.last_sql.lock().clone())
    }
}

/// Statement handle that reports every call before handing it to the
/// real statement.
pub struct StatementSpy<S: ?Sized> {
    core: SpyCore,
    state: Arc<StatementState>,
    registry_id: u64,
    batch: Vec<String>,
    delegate: Box<S>,
}

impl<S: ?Sized> fmt::Debug for StatementSpy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementSpy")
            .field("connection", &self.core.connection_number())
            .field("class", &self.core.class())
            .field("template", &self.state.template)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> StatementSpy<S> {
    /// Wrap `delegate`. `template` is the SQL it was prepared with, if any.
    #[track_caller]
    pub(crate) fn new(core: SpyCore, template: Option<String>, delegate: Box<S>) -> Self {
        let state = Arc::new(StatementState {
            template,
            trace: ArgumentTrace::new(),
            last_sql: Mutex::new(None),
        });
        let weak: Weak<dyn ActiveStatement> = Arc::downgrade(&state) as Weak<dyn ActiveStatement>;
        let registry_id = core.context().registry().track_statement(weak);

        let spy = Self {
            core,
            state,
            registry_id,
            batch: Vec::new(),
            delegate,
        };
        let created = format!("new {}", spy.core.class());
        spy.core.report_return(&created, "");
        spy
    }

    /// Connection number this statement reports under.
    pub fn connection_number(&self) -> u64 {
        self.core.connection_number()
    }

    /// The real statement.
    pub fn delegate(&self) -> &S {
        &self.delegate
    }

    /// SQL as it would be logged now: the template with bound values, or the
    /// bare template when original SQL reporting is on.
    pub fn dumped_sql(&self) -> String {
        let Some(template) = self.state.template.as_deref() else {
            return String::new();
        };
        if self.core.context().config().report_original_sql {
            template.to_owned()
        } else {
            self.state.trace.render(template)
        }
    }

    fn remember(&self, sql: &str) {
        if self.state.template.is_none() {
            *self.state.last_sql.lock() = Some(sql.to_owned());
        }
    }

    /// Record the literal for parameter `index` in the argument trace.
    fn trace_value(&self, index: usize, value: &SqlValue, hint: Option<String>) {
        let rendered = try_format(self.core.formatter(), value).unwrap_or_else(|| {
            self.core.reporter().debug(&format!(
                "{}. formatter failed on a {} parameter, using its plain form",
                self.core.connection_number(),
                value.type_hint()
            ));
            value.to_string()
        });
        match hint {
            Some(hint) if self.core.context().config().show_type_hints => {
                self.state.trace.set(index, hint + &rendered);
            }
            _ => self.state.trace.set(index, rendered),
        }
    }

    /// Text reported for a batch execution.
    fn batch_report(&self) -> String {
        match self.batch.as_slice() {
            [] => String::new(),
            [single] => single.clone(),
            entries => {
                let width = entries.len().to_string().len();
                let mut report = format!("batching {} statements:", entries.len());
                for (i, sql) in entries.iter().enumerate() {
                    let _ = write!(report, "\n{:>width$}:  {sql}", i + 1);
                }
                report
            }
        }
    }

    fn own_capability(&self, capability: &Capability) -> bool {
        match capability {
            Capability::Spy | Capability::Statement => true,
            Capability::PreparedStatement => matches!(
                self.core.class(),
                ClassType::PreparedStatement | ClassType::CallableStatement
            ),
            Capability::CallableStatement => self.core.class() == ClassType::CallableStatement,
            _ => false,
        }
    }
}

impl<S: ?Sized> Drop for StatementSpy<S> {
    fn drop(&mut self) {
        self.core.context().registry().untrack_statement(self.registry_id);
    }
}

fn wrap_result_set(core: &SpyCore, result_set: Box<dyn ResultSet>) -> Box<dyn ResultSet> {
    Box::new(ResultSetSpy::new(core.child(ClassType::ResultSet), result_set))
}

impl<S: ?Sized + Statement + 'static> Wrapper for StatementSpy<S> {
    #[track_caller]
    fn is_wrapper_for(&self, capability: &Capability) -> SqlResult<bool> {
        let method = format!("is_wrapper_for({capability})");
        if self.own_capability(capability) {
            return self.core.invoke(&method, || Ok(true));
        }
        self.core
            .invoke(&method, || self.delegate.is_wrapper_for(capability))
    }

    #[track_caller]
    fn unwrap_for(&self, capability: &Capability) -> SqlResult<&dyn Any> {
        let method = format!("unwrap_for({capability})");
        if self.own_capability(capability) {
            self.core.report_return(&method, &self.core.class().to_string());
            return Ok(self);
        }
        match self.delegate.unwrap_for(capability) {
            Ok(inner) => {
                self.core.report_return(&method, &capability.to_string());
                Ok(inner)
            }
            Err(error) => {
                self.core.report_failure(&method, &error);
                Err(error)
            }
        }
    }
}

impl<S: ?Sized + Statement + 'static> Statement for StatementSpy<S> {
    #[track_caller]
    fn execute(&mut self, sql: &str) -> SqlResult<bool> {
        self.remember(sql);
        let method = format!("execute({sql})");
        self.core
            .invoke_sql(&method, sql, || self.delegate.execute(sql))
    }

    #[track_caller]
    fn execute_query(&mut self, sql: &str) -> SqlResult<Box<dyn ResultSet>> {
        self.remember(sql);
        let method = format!("execute_query({sql})");
        let core = &self.core;
        core.invoke_sql_map(
            &method,
            sql,
            || self.delegate.execute_query(sql),
            |rows| wrap_result_set(core, rows),
        )
    }

    #[track_caller]
    fn execute_update(&mut self, sql: &str) -> SqlResult<u64> {
        self.remember(sql);
        let method = format!("execute_update({sql})");
        self.core
            .invoke_sql(&method, sql, || self.delegate.execute_update(sql))
    }

    #[track_caller]
    fn add_batch(&mut self, sql: &str) -> SqlResult<()> {
        self.batch.push(format!("{STATEMENT_SQL_WARNING}{sql}"));
        let method = format!("add_batch({sql})");
        self.core.invoke(&method, || self.delegate.add_batch(sql))
    }

    #[track_caller]
    fn clear_batch(&mut self) -> SqlResult<()> {
        self.batch.clear();
        self.core
            .invoke("clear_batch()", || self.delegate.clear_batch())
    }

    #[track_caller]
    fn execute_batch(&mut self) -> SqlResult<Vec<i64>> {
        let sql = self.batch_report();
        let counts = self
            .core
            .invoke_sql("execute_batch()", &sql, || self.delegate.execute_batch())?;
        self.batch.clear();
        Ok(counts)
    }

    #[track_caller]
    fn result_set(&mut self) -> SqlResult<Option<Box<dyn ResultSet>>> {
        let core = &self.core;
        core.invoke_map(
            "result_set()",
            || self.delegate.result_set(),
            |rows| rows.map(|rows| wrap_result_set(core, rows)),
        )
    }

    #[track_caller]
    fn update_count(&self) -> SqlResult<Option<u64>> {
        self.core
            .invoke("update_count()", || self.delegate.update_count())
    }

    #[track_caller]
    fn more_results(&mut self) -> SqlResult<bool> {
        self.core
            .invoke("more_results()", || self.delegate.more_results())
    }

    #[track_caller]
    fn generated_keys(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        let core = &self.core;
        core.invoke_map(
            "generated_keys()",
            || self.delegate.generated_keys(),
            |rows| wrap_result_set(core, rows),
        )
    }

    #[track_caller]
    fn set_max_rows(&mut self, max: u64) -> SqlResult<()> {
        let method = format!("set_max_rows({max})");
        self.core.invoke(&method, || self.delegate.set_max_rows(max))
    }

    #[track_caller]
    fn max_rows(&self) -> SqlResult<u64> {
        self.core.invoke("max_rows()", || self.delegate.max_rows())
    }

    #[track_caller]
    fn set_query_timeout(&mut self, timeout: Duration) -> SqlResult<()> {
        let method = format!("set_query_timeout({timeout:?})");
        self.core
            .invoke(&method, || self.delegate.set_query_timeout(timeout))
    }

    #[track_caller]
    fn query_timeout(&self) -> SqlResult<Duration> {
        self.core
            .invoke("query_timeout()", || self.delegate.query_timeout())
    }

    #[track_caller]
    fn set_fetch_size(&mut self, rows: u32) -> SqlResult<()> {
        let method = format!("set_fetch_size({rows})");
        self.core
            .invoke(&method, || self.delegate.set_fetch_size(rows))
    }

    #[track_caller]
    fn fetch_size(&self) -> SqlResult<u32> {
        self.core.invoke("fetch_size()", || self.delegate.fetch_size())
    }

    #[track_caller]
    fn cancel(&mut self) -> SqlResult<()> {
        self.core.invoke("cancel()", || self.delegate.cancel())
    }

    #[track_caller]
    fn warnings(&self) -> SqlResult<Option<String>> {
        self.core.invoke("warnings()", || self.delegate.warnings())
    }

    #[track_caller]
    fn clear_warnings(&mut self) -> SqlResult<()> {
        self.core
            .invoke("clear_warnings()", || self.delegate.clear_warnings())
    }

    #[track_caller]
    fn close(&mut self) -> SqlResult<()> {
        self.core.context().registry().untrack_statement(self.registry_id);
        self.core.invoke("close()", || self.delegate.close())
    }

    #[track_caller]
    fn is_closed(&self) -> SqlResult<bool> {
        self.core.invoke("is_closed()", || self.delegate.is_closed())
    }
}

impl<S: ?Sized + PreparedStatement + 'static> PreparedStatement for StatementSpy<S> {
    #[track_caller]
    fn set_value(&mut self, index: usize, value: SqlValue) -> SqlResult<()> {
        let hint = (!value.is_null()).then(|| value.type_hint());
        self.trace_value(index, &value, hint);
        let method = format!("set_value({index}, {value})");
        self.core
            .invoke(&method, || self.delegate.set_value(index, value))
    }

    #[track_caller]
    fn set_stream(
        &mut self,
        index: usize,
        kind: StreamKind,
        reader: Box<dyn Read + Send>,
        length: Option<u64>,
    ) -> SqlResult<()> {
        let description = match length {
            Some(length) => format!("<{kind} of length {length}>"),
            None => format!("<{kind}>"),
        };
        self.trace_value(
            index,
            &SqlValue::Text(description.clone()),
            Some(format!("/*<{kind}>*/")),
        );
        let method = format!("set_stream({index}, {description})");
        self.core.invoke(&method, || {
            self.delegate.set_stream(index, kind, reader, length)
        })
    }

    #[track_caller]
    fn clear_parameters(&mut self) -> SqlResult<()> {
        self.state.trace.clear();
        self.core
            .invoke("clear_parameters()", || self.delegate.clear_parameters())
    }

    #[track_caller]
    fn execute_prepared(&mut self) -> SqlResult<bool> {
        let sql = self.dumped_sql();
        self.core
            .invoke_sql("execute_prepared()", &sql, || self.delegate.execute_prepared())
    }

    #[track_caller]
    fn execute_query_prepared(&mut self) -> SqlResult<Box<dyn ResultSet>> {
        let sql = self.dumped_sql();
        let core = &self.core;
        core.invoke_sql_map(
            "execute_query_prepared()",
            &sql,
            || self.delegate.execute_query_prepared(),
            |rows| wrap_result_set(core, rows),
        )
    }

    #[track_caller]
    fn execute_update_prepared(&mut self) -> SqlResult<u64> {
        let sql = self.dumped_sql();
        self.core.invoke_sql("execute_update_prepared()", &sql, || {
            self.delegate.execute_update_prepared()
        })
    }

    #[track_caller]
    fn add_batch_prepared(&mut self) -> SqlResult<()> {
        self.batch.push(self.dumped_sql());
        self.core
            .invoke("add_batch_prepared()", || self.delegate.add_batch_prepared())
    }
}

impl<S: ?Sized + CallableStatement + 'static> CallableStatement for StatementSpy<S> {
    #[track_caller]
    fn register_out_parameter(&mut self, index: usize, sql_type: SqlType) -> SqlResult<()> {
        self.trace_value(index, &SqlValue::Text("<OUT>".to_owned()), None);
        let method = format!("register_out_parameter({index}, {sql_type})");
        self.core.invoke(&method, || {
            self.delegate.register_out_parameter(index, sql_type)
        })
    }

    #[track_caller]
    fn register_out_parameter_named(&mut self, name: &str, sql_type: SqlType) -> SqlResult<()> {
        let method = format!("register_out_parameter_named({name}, {sql_type})");
        self.core.invoke(&method, || {
            self.delegate.register_out_parameter_named(name, sql_type)
        })
    }

    #[track_caller]
    fn set_value_named(&mut self, name: &str, value: SqlValue) -> SqlResult<()> {
        let method = format!("set_value_named({name}, {value})");
        self.core
            .invoke(&method, || self.delegate.set_value_named(name, value))
    }

    #[track_caller]
    fn out_value(&mut self, index: usize) -> SqlResult<SqlValue> {
        let method = format!("out_value({index})");
        self.core.invoke(&method, || self.delegate.out_value(index))
    }

    #[track_caller]
    fn out_value_named(&mut self, name: &str) -> SqlResult<SqlValue> {
        let method = format!("out_value_named({name})");
        self.core
            .invoke(&method, || self.delegate.out_value_named(name))
    }

    #[track_caller]
    fn was_null(&self) -> SqlResult<bool> {
        self.core.invoke("was_null()", || self.delegate.was_null())
    }
}

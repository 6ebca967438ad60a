//! Interception layer.
//!
//! Every spy pairs a [`SpyCore`] (connection identity, reporter access) with
//! the real handle. Operations go through one of two primitives:
//! [`SpyCore::invoke`] for plain calls and [`SpyCore::invoke_sql`] for calls
//! that run SQL. Both report the outcome and hand the delegate's result, or
//! its error, back unchanged.

mod connection;
mod result_set;
mod statement;

use std::fmt::Write;
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

pub use connection::ConnectionSpy;
pub use result_set::ResultSetSpy;
pub use statement::{CallableStatementSpy, PreparedStatementSpy, StatementSpy};

use crate::api::{CallableStatement, PreparedStatement, ResultSet, Savepoint, Statement};
use crate::context::SpyContext;
use crate::error::{SqlError, SqlResult};
use crate::format::ParameterFormatter;
use crate::report::{ClassType, Event, Origin, Reporter};
use crate::value::SqlValue;

/// State shared by a connection spy and every handle derived from it.
#[derive(Debug)]
pub(crate) struct ConnectionShared {
    pub(crate) number: u64,
    pub(crate) formatter: Arc<dyn ParameterFormatter>,
    pub(crate) context: Arc<SpyContext>,
}

/// Identity and reporting access of one spied handle.
#[derive(Debug, Clone)]
pub(crate) struct SpyCore {
    shared: Arc<ConnectionShared>,
    class: ClassType,
}

impl SpyCore {
    pub(crate) const fn new(shared: Arc<ConnectionShared>, class: ClassType) -> Self {
        Self { shared, class }
    }

    /// Core for a handle of `class` produced by this one.
    pub(crate) fn child(&self, class: ClassType) -> Self {
        Self::new(Arc::clone(&self.shared), class)
    }

    pub(crate) fn connection_number(&self) -> u64 {
        self.shared.number
    }

    pub(crate) const fn class(&self) -> ClassType {
        self.class
    }

    pub(crate) fn context(&self) -> &SpyContext {
        &self.shared.context
    }

    pub(crate) fn reporter(&self) -> &Reporter {
        self.shared.context.reporter()
    }

    pub(crate) fn formatter(&self) -> &dyn ParameterFormatter {
        self.shared.formatter.as_ref()
    }

    fn origin(&self, site: &'static Location<'static>) -> Origin {
        Origin {
            connection_number: self.shared.number,
            class: self.class,
            site,
        }
    }

    /// Report a return without a delegated call, e.g. construction.
    #[track_caller]
    pub(crate) fn report_return(&self, method: &str, returned: &str) {
        if self.reporter().is_return_enabled(self.class) {
            let origin = self.origin(Location::caller());
            self.reporter()
                .report(&origin, Event::MethodReturned { method, returned });
        }
    }

    /// Delegate a call that runs no SQL.
    #[track_caller]
    pub(crate) fn invoke<T: ReturnMessage>(
        &self,
        method: &str,
        call: impl FnOnce() -> SqlResult<T>,
    ) -> SqlResult<T> {
        self.invoke_map(method, call, |value| value)
    }

    /// Like [`Self::invoke`], passing a successful result through `map`
    /// (typically wrapping a returned handle) before the return is reported.
    #[track_caller]
    pub(crate) fn invoke_map<T, U: ReturnMessage>(
        &self,
        method: &str,
        call: impl FnOnce() -> SqlResult<T>,
        map: impl FnOnce(T) -> U,
    ) -> SqlResult<U> {
        let origin = self.origin(Location::caller());
        match call() {
            Ok(value) => {
                let value = map(value);
                self.returned(&origin, method, &value);
                Ok(value)
            }
            Err(error) => {
                self.failed(&origin, method, &error);
                Err(error)
            }
        }
    }

    /// Report a failure of a call made outside [`Self::invoke`].
    #[track_caller]
    pub(crate) fn report_failure(&self, method: &str, error: &SqlError) {
        self.failed(&self.origin(Location::caller()), method, error);
    }

    fn failed(&self, origin: &Origin, method: &str, error: &SqlError) {
        self.reporter().report(
            origin,
            Event::ExceptionOccurred {
                method,
                error,
                sql: None,
                elapsed_nanos: None,
            },
        );
    }

    /// Delegate a call that runs `sql`, timing it.
    #[track_caller]
    pub(crate) fn invoke_sql<T: ReturnMessage>(
        &self,
        method: &str,
        sql: &str,
        call: impl FnOnce() -> SqlResult<T>,
    ) -> SqlResult<T> {
        self.invoke_sql_map(method, sql, call, |value| value)
    }

    #[track_caller]
    pub(crate) fn invoke_sql_map<T, U: ReturnMessage>(
        &self,
        method: &str,
        sql: &str,
        call: impl FnOnce() -> SqlResult<T>,
        map: impl FnOnce(T) -> U,
    ) -> SqlResult<U> {
        let origin = self.origin(Location::caller());
        self.reporter().report(&origin, Event::SqlOccurred { method, sql });

        let start = Instant::now();
        let outcome = call();
        let elapsed = start.elapsed();
        let elapsed_nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);

        #[cfg(feature = "metrics")]
        crate::observability::record_sql(
            crate::report::SqlCategory::from_sql(sql),
            elapsed,
            outcome.is_ok(),
        );

        match outcome {
            Ok(value) => {
                self.reporter().report(
                    &origin,
                    Event::SqlTimingOccurred {
                        elapsed_nanos,
                        method,
                        sql,
                    },
                );
                let value = map(value);
                self.returned(&origin, method, &value);
                Ok(value)
            }
            Err(error) => {
                self.reporter().report(
                    &origin,
                    Event::ExceptionOccurred {
                        method,
                        error: &error,
                        sql: Some(sql),
                        elapsed_nanos: Some(elapsed_nanos),
                    },
                );
                Err(error)
            }
        }
    }

    fn returned<T: ReturnMessage + ?Sized>(&self, origin: &Origin, method: &str, value: &T) {
        if !self.reporter().is_return_enabled(self.class) {
            return;
        }
        let returned = value.return_message();
        self.reporter().report(
            origin,
            Event::MethodReturned {
                method,
                returned: &returned,
            },
        );
    }
}

/// Text reported for a value returned by a delegated call.
pub(crate) trait ReturnMessage {
    fn return_message(&self) -> String;
}

macro_rules! return_message_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ReturnMessage for $ty {
                fn return_message(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

return_message_via_display!(bool, u32, u64, usize, String, SqlValue, Savepoint);

impl ReturnMessage for () {
    fn return_message(&self) -> String {
        String::new()
    }
}

impl ReturnMessage for std::time::Duration {
    fn return_message(&self) -> String {
        format!("{self:?}")
    }
}

impl ReturnMessage for crate::api::IsolationLevel {
    fn return_message(&self) -> String {
        self.to_string()
    }
}

impl<T: ReturnMessage> ReturnMessage for Option<T> {
    fn return_message(&self) -> String {
        self.as_ref()
            .map_or_else(|| "null".to_owned(), ReturnMessage::return_message)
    }
}

impl ReturnMessage for Vec<i64> {
    fn return_message(&self) -> String {
        let mut out = String::from("[");
        for (i, count) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{count}");
        }
        out.push(']');
        out
    }
}

impl ReturnMessage for Box<dyn ResultSet> {
    fn return_message(&self) -> String {
        ClassType::ResultSet.to_string()
    }
}

impl ReturnMessage for Box<dyn Statement> {
    fn return_message(&self) -> String {
        ClassType::Statement.to_string()
    }
}

impl ReturnMessage for Box<dyn PreparedStatement> {
    fn return_message(&self) -> String {
        ClassType::PreparedStatement.to_string()
    }
}

impl ReturnMessage for Box<dyn CallableStatement> {
    fn return_message(&self) -> String {
        ClassType::CallableStatement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_return_messages() {
        assert_eq!(().return_message(), "");
        assert_eq!(true.return_message(), "true");
        assert_eq!(42_u64.return_message(), "42");
        assert_eq!(None::<String>.return_message(), "null");
        assert_eq!(Some("x".to_owned()).return_message(), "x");
        assert_eq!(vec![1_i64, -2, 3].return_message(), "[1, -2, 3]");
        assert_eq!(Vec::<i64>::new().return_message(), "[]");
        assert_eq!(SqlValue::Int(5).return_message(), "5");
        assert_eq!(Duration::from_millis(1500).return_message(), "1.5s");
    }
}

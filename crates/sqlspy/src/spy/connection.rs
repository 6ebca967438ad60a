use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use super::{ConnectionShared, SpyCore, StatementSpy};
use crate::api::{
    CallableStatement, Capability, Connection, IsolationLevel, PreparedStatement, Savepoint,
    Statement, Wrapper,
};
use crate::context::SpyContext;
use crate::error::SqlResult;
use crate::format::ParameterFormatter;
use crate::report::{ClassType, Event};

/// Connection handle that reports every call and hands out spied statements.
///
/// Each spy takes the next connection number from the registry and stays
/// registered until it is closed or dropped.
pub struct ConnectionSpy {
    core: SpyCore,
    delegate: Box<dyn Connection>,
    closed: bool,
}

impl fmt::Debug for ConnectionSpy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpy")
            .field("number", &self.core.connection_number())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ConnectionSpy {
    /// Wrap an open connection. `driver` names the driver that opened it.
    #[track_caller]
    pub fn new(
        context: Arc<SpyContext>,
        delegate: Box<dyn Connection>,
        formatter: Arc<dyn ParameterFormatter>,
        driver: &str,
    ) -> Self {
        let number = context.registry().next_connection_number();
        if let Some(dump) = context.registry().track_connection(number, driver) {
            for line in dump {
                context.reporter().debug(&line);
            }
        }

        let core = SpyCore::new(
            Arc::new(ConnectionShared {
                number,
                formatter,
                context,
            }),
            ClassType::Connection,
        );
        core.reporter().report(
            &core.origin(Location::caller()),
            Event::ConnectionOpened {
                registry: core.context().registry(),
            },
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_connection_opened();
        core.report_return("New connection", "");

        Self {
            core,
            delegate,
            closed: false,
        }
    }

    /// Number identifying this connection in every record it produces.
    pub fn connection_number(&self) -> u64 {
        self.core.connection_number()
    }

    /// The real connection.
    pub fn delegate(&self) -> &dyn Connection {
        self.delegate.as_ref()
    }

    /// Remove from the registry and report the close, once.
    #[track_caller]
    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let registry = self.core.context().registry();
        registry.untrack_connection(self.core.connection_number());
        self.core.reporter().report(
            &self.core.origin(Location::caller()),
            Event::ConnectionClosed { registry },
        );
        #[cfg(feature = "metrics")]
        crate::observability::record_connection_closed();
    }
}

impl Drop for ConnectionSpy {
    fn drop(&mut self) {
        self.release();
    }
}

impl Wrapper for ConnectionSpy {
    #[track_caller]
    fn is_wrapper_for(&self, capability: &Capability) -> SqlResult<bool> {
        let method = format!("is_wrapper_for({capability})");
        if matches!(capability, Capability::Connection | Capability::Spy) {
            return self.core.invoke(&method, || Ok(true));
        }
        self.core
            .invoke(&method, || self.delegate.is_wrapper_for(capability))
    }

    #[track_caller]
    fn unwrap_for(&self, capability: &Capability) -> SqlResult<&dyn Any> {
        let method = format!("unwrap_for({capability})");
        if matches!(capability, Capability::Connection | Capability::Spy) {
            self.core.report_return(&method, "Connection");
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

impl Connection for ConnectionSpy {
    #[track_caller]
    fn create_statement(&mut self) -> SqlResult<Box<dyn Statement>> {
        let core = &self.core;
        core.invoke_map(
            "create_statement()",
            || self.delegate.create_statement(),
            |statement| {
                let child = core.child(ClassType::Statement);
                Box::new(StatementSpy::new(child, None, statement)) as Box<dyn Statement>
            },
        )
    }

    #[track_caller]
    fn prepare_statement(&mut self, sql: &str) -> SqlResult<Box<dyn PreparedStatement>> {
        let method = format!("prepare_statement({sql})");
        let core = &self.core;
        core.invoke_map(
            &method,
            || self.delegate.prepare_statement(sql),
            |statement| {
                let child = core.child(ClassType::PreparedStatement);
                Box::new(StatementSpy::new(child, Some(sql.to_owned()), statement))
                    as Box<dyn PreparedStatement>
            },
        )
    }

    #[track_caller]
    fn prepare_call(&mut self, sql: &str) -> SqlResult<Box<dyn CallableStatement>> {
        let method = format!("prepare_call({sql})");
        let core = &self.core;
        core.invoke_map(
            &method,
            || self.delegate.prepare_call(sql),
            |statement| {
                let child = core.child(ClassType::CallableStatement);
                Box::new(StatementSpy::new(child, Some(sql.to_owned()), statement))
                    as Box<dyn CallableStatement>
            },
        )
    }

    #[track_caller]
    fn native_sql(&mut self, sql: &str) -> SqlResult<String> {
        let method = format!("native_sql({sql})");
        self.core.invoke(&method, || self.delegate.native_sql(sql))
    }

    #[track_caller]
    fn set_auto_commit(&mut self, auto_commit: bool) -> SqlResult<()> {
        let method = format!("set_auto_commit({auto_commit})");
        self.core
            .invoke(&method, || self.delegate.set_auto_commit(auto_commit))
    }

    #[track_caller]
    fn auto_commit(&self) -> SqlResult<bool> {
        self.core
            .invoke("auto_commit()", || self.delegate.auto_commit())
    }

    #[track_caller]
    fn commit(&mut self) -> SqlResult<()> {
        self.core.invoke("commit()", || self.delegate.commit())
    }

    #[track_caller]
    fn rollback(&mut self) -> SqlResult<()> {
        self.core.invoke("rollback()", || self.delegate.rollback())
    }

    #[track_caller]
    fn set_savepoint(&mut self, name: Option<&str>) -> SqlResult<Savepoint> {
        let method = match name {
            Some(name) => format!("set_savepoint({name})"),
            None => "set_savepoint()".to_owned(),
        };
        self.core
            .invoke(&method, || self.delegate.set_savepoint(name))
    }

    #[track_caller]
    fn rollback_to(&mut self, savepoint: &Savepoint) -> SqlResult<()> {
        let method = format!("rollback_to({savepoint})");
        self.core
            .invoke(&method, || self.delegate.rollback_to(savepoint))
    }

    #[track_caller]
    fn release_savepoint(&mut self, savepoint: &Savepoint) -> SqlResult<()> {
        let method = format!("release_savepoint({savepoint})");
        self.core
            .invoke(&method, || self.delegate.release_savepoint(savepoint))
    }

    #[track_caller]
    fn set_read_only(&mut self, read_only: bool) -> SqlResult<()> {
        let method = format!("set_read_only({read_only})");
        self.core
            .invoke(&method, || self.delegate.set_read_only(read_only))
    }

    #[track_caller]
    fn is_read_only(&self) -> SqlResult<bool> {
        self.core
            .invoke("is_read_only()", || self.delegate.is_read_only())
    }

    #[track_caller]
    fn set_transaction_isolation(&mut self, level: IsolationLevel) -> SqlResult<()> {
        let method = format!("set_transaction_isolation({level})");
        self.core
            .invoke(&method, || self.delegate.set_transaction_isolation(level))
    }

    #[track_caller]
    fn transaction_isolation(&self) -> SqlResult<IsolationLevel> {
        self.core.invoke("transaction_isolation()", || {
            self.delegate.transaction_isolation()
        })
    }

    #[track_caller]
    fn set_schema(&mut self, schema: &str) -> SqlResult<()> {
        let method = format!("set_schema({schema})");
        self.core.invoke(&method, || self.delegate.set_schema(schema))
    }

    #[track_caller]
    fn schema(&self) -> SqlResult<Option<String>> {
        self.core.invoke("schema()", || self.delegate.schema())
    }

    #[track_caller]
    fn is_valid(&mut self, timeout: Duration) -> SqlResult<bool> {
        let method = format!("is_valid({timeout:?})");
        self.core.invoke(&method, || self.delegate.is_valid(timeout))
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
    fn driver_name(&self) -> SqlResult<String> {
        self.core
            .invoke("driver_name()", || self.delegate.driver_name())
    }

    /// Close the real connection. The spy is unregistered even when the
    /// driver fails to close.
    #[track_caller]
    fn close(&mut self) -> SqlResult<()> {
        let outcome = self.delegate.close();
        self.release();
        match outcome {
            Ok(()) => {
                self.core.report_return("close()", "");
                Ok(())
            }
            Err(error) => {
                self.core.report_failure("close()", &error);
                Err(error)
            }
        }
    }

    #[track_caller]
    fn is_closed(&self) -> SqlResult<bool> {
        self.core.invoke("is_closed()", || self.delegate.is_closed())
    }
}

//! Transparent SQL logging proxy for relational database drivers.
//!
//! sqlspy sits between an application and its database driver. Every call on
//! a connection, statement or result set is forwarded unchanged to the real
//! driver and reported on one of six logging channels: the SQL with bound
//! values substituted, execution timing, returned values, failures and the
//! connection lifecycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sqlspy::{SpyContext, SpyDriver, init_logging, load_config};
//!
//! let config = load_config()?.build();
//! init_logging(&config.logging)?;
//!
//! let mut driver = SpyDriver::new(Arc::new(SpyContext::with_tracing(config)));
//! driver.register(Arc::new(my_driver));
//! let conn = driver.connect("spy:postgres://localhost/app", &Default::default())?;
//! ```

pub mod api;
pub mod config;
mod context;
mod driver;
mod error;
pub mod format;
pub mod observability;
pub mod registry;
pub mod report;
pub mod spy;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod trace;
pub mod value;

pub use api::{
    CallableStatement, Capability, Connection, Driver, IsolationLevel, PreparedStatement,
    Properties, ResultSet, Savepoint, Statement, Wrapper,
};
pub use config::{
    ConfigBuilder, LoggingConfig, SpyConfig, TimingConfig, load_config, load_config_from_path,
};
pub use context::SpyContext;
pub use driver::{SpyDriver, URL_PREFIX};
pub use error::{Result, SpyError, SqlError, SqlResult};
pub use format::{Dialect, FormatterRegistry, ParameterFormatter};
pub use observability::init_logging;
pub use registry::ConnectionRegistry;
pub use report::{Channel, LogSink, Record, Reporter, SqlCategory, SqlFilter, TracingSink};
pub use spy::{
    CallableStatementSpy, ConnectionSpy, PreparedStatementSpy, ResultSetSpy, StatementSpy,
};
pub use trace::ArgumentTrace;
pub use value::{SqlType, SqlValue, StreamKind};

//! Logging backend contract.

use std::fmt::{self, Debug};

use tracing::Level;

use crate::error::SqlError;

/// Named logging destination, leveled independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Calls and returns on everything except result sets, plus failures.
    Audit,
    /// Calls and returns on result sets.
    ResultSet,
    /// SQL about to run.
    SqlOnly,
    /// SQL execution time and failures.
    SqlTiming,
    /// Connection open and close.
    Connection,
    /// Diagnostics of the proxy layer itself.
    Debug,
}

impl Channel {
    pub const ALL: [Self; 6] = [
        Self::Audit,
        Self::ResultSet,
        Self::SqlOnly,
        Self::SqlTiming,
        Self::Connection,
        Self::Debug,
    ];

    /// Channels whose activity turns interception on.
    pub const REPORTING: [Self; 5] = [
        Self::Audit,
        Self::ResultSet,
        Self::SqlOnly,
        Self::SqlTiming,
        Self::Connection,
    ];

    /// `tracing` target the channel is emitted under.
    #[must_use]
    pub const fn target(&self) -> &'static str {
        match self {
            Self::Audit => "sqlspy::audit",
            Self::ResultSet => "sqlspy::resultset",
            Self::SqlOnly => "sqlspy::sqlonly",
            Self::SqlTiming => "sqlspy::sqltiming",
            Self::Connection => "sqlspy::connection",
            Self::Debug => "sqlspy::debug",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::ResultSet => "resultset",
            Self::SqlOnly => "sqlonly",
            Self::SqlTiming => "sqltiming",
            Self::Connection => "connection",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured timing annotation attached to SQL timing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingMarker {
    pub sql: String,
    pub executed_in_nanos: u64,
}

impl fmt::Display for TimingMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"sql\"=\"{}\",\"executedInNanoSec\"={}}}",
            self.sql, self.executed_in_nanos
        )
    }
}

/// A single log entry handed to a [`LogSink`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub channel: Channel,
    pub level: Level,
    pub message: &'a str,
    pub marker: Option<&'a TimingMarker>,
    pub error: Option<&'a SqlError>,
}

/// Destination of reported events.
///
/// `enabled` is asked before any message is built, so it must be cheap.
pub trait LogSink: Send + Sync + Debug {
    fn enabled(&self, channel: Channel, level: Level) -> bool;

    fn log(&self, record: &Record<'_>);
}

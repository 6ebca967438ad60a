//! Reporting policy.
//!
//! The [`Reporter`] decides, per event, whether anything is logged, on which
//! channel, at which level and with which text. It never fails: a panic in a
//! sink or in message building is contained and replaced by a short note on
//! the debug channel.

mod callsite;
mod filter;
mod sink;
mod tracing_sink;

use std::fmt::{self, Write};
use std::panic::{AssertUnwindSafe, Location, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

pub use callsite::{CallSiteResolver, Frame};
pub use filter::{SqlCategory, SqlFilter};
pub use sink::{Channel, LogSink, Record, TimingMarker};
pub use tracing_sink::TracingSink;

use crate::config::{SpyConfig, TimingConfig};
use crate::error::SqlError;
use crate::registry::ConnectionRegistry;

/// Kind of handle an event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassType {
    Connection,
    Statement,
    PreparedStatement,
    CallableStatement,
    ResultSet,
}

impl ClassType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "Connection",
            Self::Statement => "Statement",
            Self::PreparedStatement => "PreparedStatement",
            Self::CallableStatement => "CallableStatement",
            Self::ResultSet => "ResultSet",
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the handle an event originates from, plus the call site.
#[derive(Debug, Clone, Copy)]
pub struct Origin {
    pub connection_number: u64,
    pub class: ClassType,
    pub site: &'static Location<'static>,
}

/// Something that happened on a spied handle.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    MethodReturned {
        method: &'a str,
        returned: &'a str,
    },
    ExceptionOccurred {
        method: &'a str,
        error: &'a SqlError,
        sql: Option<&'a str>,
        elapsed_nanos: Option<u64>,
    },
    SqlOccurred {
        method: &'a str,
        sql: &'a str,
    },
    SqlTimingOccurred {
        elapsed_nanos: u64,
        method: &'a str,
        sql: &'a str,
    },
    ConnectionOpened {
        registry: &'a ConnectionRegistry,
    },
    ConnectionClosed {
        registry: &'a ConnectionRegistry,
    },
}

impl Event<'_> {
    fn describe(&self) -> &str {
        match *self {
            Self::MethodReturned { method, .. }
            | Self::ExceptionOccurred { method, .. }
            | Self::SqlOccurred { method, .. }
            | Self::SqlTimingOccurred { method, .. } => method,
            Self::ConnectionOpened { .. } => "connection opened",
            Self::ConnectionClosed { .. } => "connection closed",
        }
    }
}

const fn return_channel(class: ClassType) -> Channel {
    match class {
        ClassType::ResultSet => Channel::ResultSet,
        _ => Channel::Audit,
    }
}

/// Applies the logging policy and hands finished records to a [`LogSink`].
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Arc<dyn LogSink>,
    filter: SqlFilter,
    trim_sql: bool,
    timing: TimingConfig,
    call_site: CallSiteResolver,
}

impl Reporter {
    pub fn new(sink: Arc<dyn LogSink>, config: &SpyConfig) -> Self {
        Self {
            sink,
            filter: config.sql_filter,
            trim_sql: config.trim_sql,
            timing: config.timing.clone(),
            call_site: CallSiteResolver::new(
                config.debug_stack_prefix.clone(),
                config.dump_full_debug_stack_trace,
            ),
        }
    }

    /// True when at least one reporting channel accepts errors.
    ///
    /// When false, the driver hands out unwrapped connections.
    pub fn is_logging_enabled(&self) -> bool {
        Channel::REPORTING
            .iter()
            .any(|channel| self.sink.enabled(*channel, Level::ERROR))
    }

    pub fn is_enabled(&self, channel: Channel, level: Level) -> bool {
        self.sink.enabled(channel, level)
    }

    /// True when method returns of `class` would be logged.
    pub fn is_return_enabled(&self, class: ClassType) -> bool {
        self.sink.enabled(return_channel(class), Level::INFO)
    }

    /// Report `event`. Never panics.
    pub fn report(&self, origin: &Origin, event: Event<'_>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(origin, &event)));
        if outcome.is_err() {
            let note = format!(
                "{}. {}.{}: reporting failed",
                origin.connection_number,
                origin.class,
                event.describe()
            );
            let _ = catch_unwind(AssertUnwindSafe(|| {
                self.emit(Channel::Debug, Level::DEBUG, &note, None, None);
            }));
        }
    }

    /// Administrative message on the debug channel.
    pub fn debug(&self, message: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            if self.sink.enabled(Channel::Debug, Level::DEBUG) {
                self.emit(Channel::Debug, Level::DEBUG, message, None, None);
            }
        }));
    }

    fn dispatch(&self, origin: &Origin, event: &Event<'_>) {
        match *event {
            Event::MethodReturned { method, returned } => {
                self.method_returned(origin, method, returned);
            }
            Event::ExceptionOccurred {
                method,
                error,
                sql,
                elapsed_nanos,
            } => self.exception_occurred(origin, method, error, sql, elapsed_nanos),
            Event::SqlOccurred { sql, .. } => self.sql_occurred(origin, sql),
            Event::SqlTimingOccurred {
                elapsed_nanos, sql, ..
            } => self.sql_timing_occurred(origin, elapsed_nanos, sql),
            Event::ConnectionOpened { registry } => {
                self.connection_event(origin, "opened", registry);
            }
            Event::ConnectionClosed { registry } => {
                self.connection_event(origin, "closed", registry);
            }
        }
    }

    fn method_returned(&self, origin: &Origin, method: &str, returned: &str) {
        let channel = return_channel(origin.class);
        if !self.sink.enabled(channel, Level::INFO) {
            return;
        }
        let header = format!(
            "{}. {}.{method} returned {returned}",
            origin.connection_number, origin.class
        );
        if self.sink.enabled(channel, Level::DEBUG) {
            let message = format!("{header} {}", self.call_site.describe(origin.site));
            self.emit(channel, Level::DEBUG, &message, None, None);
        } else {
            self.emit(channel, Level::INFO, &header, None, None);
        }
    }

    fn exception_occurred(
        &self,
        origin: &Origin,
        method: &str,
        error: &SqlError,
        sql: Option<&str>,
        elapsed_nanos: Option<u64>,
    ) {
        let header = format!("{}. {}.{method}", origin.connection_number, origin.class);
        let Some(sql) = sql else {
            for channel in [Channel::Audit, Channel::SqlOnly, Channel::SqlTiming] {
                if self.sink.enabled(channel, Level::ERROR) {
                    self.emit(channel, Level::ERROR, &header, None, Some(error));
                }
            }
            return;
        };

        let sql = self.process_sql(sql);
        let failed = elapsed_nanos
            .map(|nanos| format!(" {{FAILED after {nanos} nanoSec}}"))
            .unwrap_or_default();

        if self.sink.enabled(Channel::Audit, Level::ERROR) {
            let message = format!("{header} {sql}");
            self.emit(Channel::Audit, Level::ERROR, &message, None, Some(error));
        }
        if self.sink.enabled(Channel::SqlOnly, Level::ERROR) {
            let message = if self.sink.enabled(Channel::SqlOnly, Level::DEBUG) {
                format!(
                    "{}\n{}. {sql}",
                    self.call_site.describe(origin.site),
                    origin.connection_number
                )
            } else {
                format!("{header} {sql}")
            };
            self.emit(Channel::SqlOnly, Level::ERROR, &message, None, Some(error));
        }
        if self.sink.enabled(Channel::SqlTiming, Level::ERROR) {
            let message = if self.sink.enabled(Channel::SqlTiming, Level::DEBUG) {
                format!(
                    "{}\n{}. {sql}{failed}",
                    self.call_site.describe(origin.site),
                    origin.connection_number
                )
            } else {
                format!("{header} FAILED! {sql}{failed}")
            };
            self.emit(Channel::SqlTiming, Level::ERROR, &message, None, Some(error));
        }
    }

    fn sql_occurred(&self, origin: &Origin, sql: &str) {
        if !self.filter.allows(sql) {
            return;
        }
        let sql = self.process_sql(sql);
        if self.sink.enabled(Channel::SqlOnly, Level::DEBUG) {
            let message = format!(
                "{}\n{}. {sql}",
                self.call_site.describe(origin.site),
                origin.connection_number
            );
            self.emit(Channel::SqlOnly, Level::DEBUG, &message, None, None);
        } else if self.sink.enabled(Channel::SqlOnly, Level::INFO) {
            self.emit(Channel::SqlOnly, Level::INFO, sql, None, None);
        }
    }

    fn sql_timing_occurred(&self, origin: &Origin, elapsed_nanos: u64, sql: &str) {
        if !self.sink.enabled(Channel::SqlTiming, Level::ERROR) || !self.filter.allows(sql) {
            return;
        }
        let debug = self.sink.enabled(Channel::SqlTiming, Level::DEBUG);
        let Some(level) = self.timing_level(elapsed_nanos, debug) else {
            return;
        };

        let sql = self.process_sql(sql);
        let mut message = String::with_capacity(sql.len() + 48);
        if debug {
            let _ = write!(
                message,
                "{}\n{}. ",
                self.call_site.describe(origin.site),
                origin.connection_number
            );
        }
        let _ = write!(message, "{sql} {{executed in {elapsed_nanos} nanoSec}}");

        let marker = self.timing.use_markers.then(|| TimingMarker {
            sql: sql.to_owned(),
            executed_in_nanos: elapsed_nanos,
        });
        self.emit(Channel::SqlTiming, level, &message, marker.as_ref(), None);
    }

    /// Severity for a timing record, most severe rule first.
    ///
    /// The error threshold applies even when warnings are disabled.
    fn timing_level(&self, elapsed_nanos: u64, debug: bool) -> Option<Level> {
        let elapsed = Duration::from_nanos(elapsed_nanos);
        if self.timing.error_threshold.is_some_and(|t| elapsed >= t) {
            return Some(Level::ERROR);
        }
        if !self.sink.enabled(Channel::SqlTiming, Level::WARN) {
            return None;
        }
        if self.timing.warn_threshold.is_some_and(|t| elapsed >= t) {
            Some(Level::WARN)
        } else if debug {
            Some(Level::DEBUG)
        } else if self.sink.enabled(Channel::SqlTiming, Level::INFO) {
            Some(Level::INFO)
        } else {
            None
        }
    }

    fn connection_event(&self, origin: &Origin, what: &str, registry: &ConnectionRegistry) {
        if !self.sink.enabled(Channel::Connection, Level::INFO) {
            return;
        }
        if self.sink.enabled(Channel::Connection, Level::DEBUG) {
            let message = format!(
                "{}. Connection {what} {}",
                origin.connection_number,
                self.call_site.describe(origin.site)
            );
            self.emit(Channel::Connection, Level::INFO, &message, None, None);
            let dump = registry.open_connections_dump();
            self.emit(Channel::Connection, Level::DEBUG, &dump, None, None);
        } else {
            let message = format!("{}. Connection {what}", origin.connection_number);
            self.emit(Channel::Connection, Level::INFO, &message, None, None);
        }
    }

    fn process_sql<'s>(&self, sql: &'s str) -> &'s str {
        if self.trim_sql { sql.trim() } else { sql }
    }

    fn emit(
        &self,
        channel: Channel,
        level: Level,
        message: &str,
        marker: Option<&TimingMarker>,
        error: Option<&SqlError>,
    ) {
        self.sink.log(&Record {
            channel,
            level,
            message,
            marker,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;

    const MS: u64 = 1_000_000;

    fn origin(class: ClassType) -> Origin {
        Origin {
            connection_number: 7,
            class,
            site: Location::caller(),
        }
    }

    fn make_reporter(sink: &Arc<RecordingSink>, config: &SpyConfig) -> Reporter {
        Reporter::new(Arc::clone(sink) as Arc<dyn LogSink>, config)
    }

    fn timing_config() -> SpyConfig {
        SpyConfig::builder()
            .sql_timing_warn_threshold(Some(Duration::from_millis(100)))
            .sql_timing_error_threshold(Some(Duration::from_millis(500)))
            .build()
    }

    fn timing(reporter: &Reporter, nanos: u64) {
        reporter.report(
            &origin(ClassType::Statement),
            Event::SqlTimingOccurred {
                elapsed_nanos: nanos,
                method: "execute_query(select 1)",
                sql: "select 1",
            },
        );
    }

    #[test]
    fn test_logging_disabled_when_every_channel_is_off() {
        let sink = Arc::new(RecordingSink::new());
        assert!(!make_reporter(&sink, &SpyConfig::default()).is_logging_enabled());

        let sink = Arc::new(RecordingSink::new().with_level(Channel::Debug, Level::TRACE));
        assert!(!make_reporter(&sink, &SpyConfig::default()).is_logging_enabled());

        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::ERROR));
        assert!(make_reporter(&sink, &SpyConfig::default()).is_logging_enabled());
    }

    #[test]
    fn test_method_returned_goes_to_audit_at_info() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::Audit, Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Connection),
            Event::MethodReturned {
                method: "auto_commit()",
                returned: "true",
            },
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, Channel::Audit);
        assert_eq!(records[0].level, Level::INFO);
        assert_eq!(records[0].message, "7. Connection.auto_commit() returned true");
    }

    #[test]
    fn test_result_set_returns_go_to_resultset_channel() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::ResultSet),
            Event::MethodReturned {
                method: "next()",
                returned: "false",
            },
        );
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, Channel::ResultSet);
    }

    #[test]
    fn test_method_returned_at_debug_carries_call_site() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::Audit, Level::DEBUG));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Statement),
            Event::MethodReturned {
                method: "close()",
                returned: "",
            },
        );
        let records = sink.records();
        assert_eq!(records[0].level, Level::DEBUG);
        assert!(records[0].message.starts_with("7. Statement.close() returned  "));
        assert!(records[0].message.len() > "7. Statement.close() returned  ".len());
    }

    #[test]
    fn test_sql_occurred_at_info_is_trimmed_sql() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlOnly, Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Statement),
            Event::SqlOccurred {
                method: "execute(...)",
                sql: "  select 1  ",
            },
        );
        assert_eq!(sink.messages(Channel::SqlOnly), vec!["select 1".to_owned()]);
    }

    #[test]
    fn test_sql_occurred_untrimmed_when_disabled() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlOnly, Level::INFO));
        let config = SpyConfig::builder().trim_sql(false).build();
        let reporter = make_reporter(&sink, &config);
        reporter.report(
            &origin(ClassType::Statement),
            Event::SqlOccurred {
                method: "execute(...)",
                sql: " select 1 ",
            },
        );
        assert_eq!(sink.messages(Channel::SqlOnly), vec![" select 1 ".to_owned()]);
    }

    #[test]
    fn test_sql_occurred_at_debug_has_connection_number() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlOnly, Level::DEBUG));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Statement),
            Event::SqlOccurred {
                method: "execute(...)",
                sql: "select 1",
            },
        );
        let records = sink.records();
        assert_eq!(records[0].level, Level::DEBUG);
        assert!(records[0].message.ends_with("\n7. select 1"));
    }

    #[test]
    fn test_filter_suppresses_sql_occurred() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::INFO));
        let config = SpyConfig::builder()
            .sql_filter(SqlFilter::none().with(SqlCategory::Insert, true))
            .build();
        let reporter = make_reporter(&sink, &config);
        for sql in ["SELECT * FROM t", "do", "INSERT INTO t VALUES (1)"] {
            reporter.report(
                &origin(ClassType::Statement),
                Event::SqlOccurred { method: "execute", sql },
            );
        }
        assert_eq!(
            sink.messages(Channel::SqlOnly),
            vec!["INSERT INTO t VALUES (1)".to_owned()]
        );
    }

    #[test]
    fn test_timing_below_thresholds_logs_at_ambient_level() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 50 * MS);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::INFO);
        assert_eq!(records[0].message, "select 1 {executed in 50000000 nanoSec}");
    }

    #[test]
    fn test_timing_ambient_debug_level() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::DEBUG));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 50 * MS);
        let records = sink.records();
        assert_eq!(records[0].level, Level::DEBUG);
        assert!(records[0].message.ends_with("\n7. select 1 {executed in 50000000 nanoSec}"));
    }

    #[test]
    fn test_timing_over_warn_threshold() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 200 * MS);
        assert_eq!(sink.records()[0].level, Level::WARN);
    }

    #[test]
    fn test_timing_over_error_threshold() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 600 * MS);
        assert_eq!(sink.records()[0].level, Level::ERROR);
    }

    #[test]
    fn test_timing_threshold_is_inclusive() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 100 * MS);
        timing(&reporter, 500 * MS);
        let levels: Vec<_> = sink.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Level::WARN, Level::ERROR]);
    }

    #[test]
    fn test_error_threshold_fires_with_warnings_disabled() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::ERROR));
        let reporter = make_reporter(&sink, &timing_config());
        timing(&reporter, 50 * MS);
        timing(&reporter, 200 * MS);
        timing(&reporter, 600 * MS);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::ERROR);
    }

    #[test]
    fn test_timing_without_thresholds_never_escalates() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        timing(&reporter, 60_000 * MS);
        assert_eq!(sink.records()[0].level, Level::INFO);
    }

    #[test]
    fn test_timing_marker_attached_when_enabled() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let config = SpyConfig::builder().sql_timing_use_markers(true).build();
        let reporter = make_reporter(&sink, &config);
        timing(&reporter, 1234);
        let records = sink.records();
        let marker = records[0].marker.as_ref().unwrap();
        assert_eq!(marker.sql, "select 1");
        assert_eq!(marker.executed_in_nanos, 1234);
        assert!(records[0].message.ends_with("{executed in 1234 nanoSec}"));
    }

    #[test]
    fn test_timing_respects_filter() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::INFO));
        let config = SpyConfig::builder()
            .sql_filter(SqlFilter::all().with(SqlCategory::Select, false))
            .build();
        let reporter = make_reporter(&sink, &config);
        timing(&reporter, 10);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_exception_without_sql_hits_three_channels() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::ERROR));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        let error = SqlError::database("connection reset");
        reporter.report(
            &origin(ClassType::Connection),
            Event::ExceptionOccurred {
                method: "commit()",
                error: &error,
                sql: None,
                elapsed_nanos: None,
            },
        );
        let records = sink.records();
        let channels: Vec<_> = records.iter().map(|r| r.channel).collect();
        assert_eq!(
            channels,
            vec![Channel::Audit, Channel::SqlOnly, Channel::SqlTiming]
        );
        for record in &records {
            assert_eq!(record.level, Level::ERROR);
            assert_eq!(record.message, "7. Connection.commit()");
            assert_eq!(record.error.as_ref(), Some(&error));
        }
    }

    #[test]
    fn test_exception_with_sql_and_timing() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        let error = SqlError::database("syntax error");
        reporter.report(
            &origin(ClassType::Statement),
            Event::ExceptionOccurred {
                method: "execute(selec 1)",
                error: &error,
                sql: Some("selec 1"),
                elapsed_nanos: Some(99),
            },
        );
        assert_eq!(
            sink.messages(Channel::Audit),
            vec!["7. Statement.execute(selec 1) selec 1".to_owned()]
        );
        assert_eq!(
            sink.messages(Channel::SqlTiming),
            vec!["7. Statement.execute(selec 1) FAILED! selec 1 {FAILED after 99 nanoSec}".to_owned()]
        );
    }

    #[test]
    fn test_connection_opened_info_and_debug_dump() {
        let registry = ConnectionRegistry::new(0);
        registry.track_connection(7, "mem");
        let sink = Arc::new(RecordingSink::new().with_level(Channel::Connection, Level::INFO));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Connection),
            Event::ConnectionOpened {
                registry: &registry,
            },
        );
        assert_eq!(
            sink.messages(Channel::Connection),
            vec!["7. Connection opened".to_owned()]
        );

        let sink = Arc::new(RecordingSink::new().with_level(Channel::Connection, Level::DEBUG));
        let reporter = make_reporter(&sink, &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Connection),
            Event::ConnectionClosed {
                registry: &registry,
            },
        );
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].message.starts_with("7. Connection closed "));
        assert_eq!(records[1].level, Level::DEBUG);
        assert_eq!(records[1].message, "open connections: (1) 7");
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        #[derive(Debug)]
        struct Panicking;

        impl LogSink for Panicking {
            fn enabled(&self, _channel: Channel, _level: Level) -> bool {
                true
            }

            fn log(&self, _record: &Record<'_>) {
                panic!("backend down");
            }
        }

        let reporter = Reporter::new(Arc::new(Panicking), &SpyConfig::default());
        reporter.report(
            &origin(ClassType::Statement),
            Event::SqlOccurred {
                method: "execute",
                sql: "select 1",
            },
        );
        reporter.debug("still alive");
    }
}

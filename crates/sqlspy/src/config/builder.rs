//! Configuration builder

use std::time::Duration;

use crate::format::Dialect;
use crate::report::{SqlCategory, SqlFilter};

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct SpyConfig {
    /// Symbol prefix of application code, for call-site attribution.
    pub debug_stack_prefix: Option<String>,
    pub timing: TimingConfig,
    pub dump_full_debug_stack_trace: bool,
    pub sql_filter: SqlFilter,
    pub report_original_sql: bool,
    pub trim_sql: bool,
    pub show_type_hints: bool,
    pub connection_dump_threshold: usize,
    /// Extra driver name to dialect mappings.
    pub dialects: Vec<(String, Dialect)>,
    pub logging: LoggingConfig,
}

impl SpyConfig {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn is_sql_filtering(&self) -> bool {
        self.sql_filter.is_filtering()
    }
}

impl Default for SpyConfig {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// SQL timing thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingConfig {
    pub warn_threshold: Option<Duration>,
    pub error_threshold: Option<Duration>,
    pub use_markers: bool,
}

/// Logging subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            json_logs: false,
        }
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    debug_stack_prefix: Option<String>,
    warn_threshold: Option<Duration>,
    error_threshold: Option<Duration>,
    use_markers: Option<bool>,
    dump_full_debug_stack_trace: Option<bool>,
    sql_filter: Option<SqlFilter>,
    report_original_sql: Option<bool>,
    trim_sql: Option<bool>,
    show_type_hints: Option<bool>,
    connection_dump_threshold: Option<usize>,
    dialects: Vec<(String, Dialect)>,
    log_level: Option<String>,
    json_logs: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debug_stack_prefix: None,
            warn_threshold: None,
            error_threshold: None,
            use_markers: None,
            dump_full_debug_stack_trace: None,
            sql_filter: None,
            report_original_sql: None,
            trim_sql: None,
            show_type_hints: None,
            connection_dump_threshold: None,
            dialects: Vec::new(),
            log_level: None,
            json_logs: None,
        }
    }

    #[must_use]
    pub fn debug_stack_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.debug_stack_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub const fn sql_timing_warn_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.warn_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn sql_timing_error_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.error_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn sql_timing_use_markers(mut self, enabled: bool) -> Self {
        self.use_markers = Some(enabled);
        self
    }

    #[must_use]
    pub const fn dump_full_debug_stack_trace(mut self, enabled: bool) -> Self {
        self.dump_full_debug_stack_trace = Some(enabled);
        self
    }

    #[must_use]
    pub const fn sql_filter(mut self, filter: SqlFilter) -> Self {
        self.sql_filter = Some(filter);
        self
    }

    /// Enable or disable dumping of one SQL category.
    #[must_use]
    pub const fn dump_sql(mut self, category: SqlCategory, enabled: bool) -> Self {
        let filter = match self.sql_filter {
            Some(filter) => filter,
            None => SqlFilter::all(),
        };
        self.sql_filter = Some(filter.with(category, enabled));
        self
    }

    #[must_use]
    pub const fn report_original_sql(mut self, enabled: bool) -> Self {
        self.report_original_sql = Some(enabled);
        self
    }

    #[must_use]
    pub const fn trim_sql(mut self, enabled: bool) -> Self {
        self.trim_sql = Some(enabled);
        self
    }

    #[must_use]
    pub const fn show_type_hints(mut self, enabled: bool) -> Self {
        self.show_type_hints = Some(enabled);
        self
    }

    #[must_use]
    pub const fn connection_dump_threshold(mut self, threshold: usize) -> Self {
        self.connection_dump_threshold = Some(threshold);
        self
    }

    /// Map a driver name to a dialect, on top of the built-in names.
    #[must_use]
    pub fn dialect(mut self, driver: impl Into<String>, dialect: Dialect) -> Self {
        self.dialects.push((driver.into(), dialect));
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = Some(enabled);
        self
    }

    #[must_use]
    pub fn build(self) -> SpyConfig {
        let logging_defaults = LoggingConfig::default();
        SpyConfig {
            debug_stack_prefix: self
                .debug_stack_prefix
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
            timing: TimingConfig {
                warn_threshold: self.warn_threshold,
                error_threshold: self.error_threshold,
                use_markers: self.use_markers.unwrap_or(false),
            },
            dump_full_debug_stack_trace: self.dump_full_debug_stack_trace.unwrap_or(false),
            sql_filter: self.sql_filter.unwrap_or_default(),
            report_original_sql: self.report_original_sql.unwrap_or(false),
            trim_sql: self.trim_sql.unwrap_or(true),
            show_type_hints: self.show_type_hints.unwrap_or(false),
            connection_dump_threshold: self.connection_dump_threshold.unwrap_or(0),
            dialects: self.dialects,
            logging: LoggingConfig {
                log_level: self.log_level.unwrap_or(logging_defaults.log_level),
                json_logs: self.json_logs.unwrap_or(logging_defaults.json_logs),
            },
        }
    }
}

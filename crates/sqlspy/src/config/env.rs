//! Environment variable loading for configuration

use std::env;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use super::builder::ConfigBuilder;
use crate::report::SqlCategory;

/// Environment variable names
mod vars {
    pub const DEBUG_STACK_PREFIX: &str = "SQLSPY_DEBUG_STACK_PREFIX";
    pub const SQLTIMING_WARN_THRESHOLD_MS: &str = "SQLSPY_SQLTIMING_WARN_THRESHOLD_MS";
    pub const SQLTIMING_ERROR_THRESHOLD_MS: &str = "SQLSPY_SQLTIMING_ERROR_THRESHOLD_MS";
    pub const SQLTIMING_USE_MARKERS: &str = "SQLSPY_SQLTIMING_USE_MARKERS";
    pub const DUMP_FULL_DEBUG_STACK_TRACE: &str = "SQLSPY_DUMP_FULL_DEBUG_STACK_TRACE";
    pub const DUMP_SQL_SELECT: &str = "SQLSPY_DUMP_SQL_SELECT";
    pub const DUMP_SQL_INSERT: &str = "SQLSPY_DUMP_SQL_INSERT";
    pub const DUMP_SQL_UPDATE: &str = "SQLSPY_DUMP_SQL_UPDATE";
    pub const DUMP_SQL_DELETE: &str = "SQLSPY_DUMP_SQL_DELETE";
    pub const DUMP_SQL_CREATE: &str = "SQLSPY_DUMP_SQL_CREATE";
    pub const DUMP_SQL_REPORT_ORIGINAL: &str = "SQLSPY_DUMP_SQL_REPORT_ORIGINAL";
    pub const TRIM_SQL: &str = "SQLSPY_TRIM_SQL";
    pub const CONNECTION_DUMP_THRESHOLD: &str = "SQLSPY_CONNECTION_DUMP_THRESHOLD";
    pub const SHOW_TYPE_HINTS: &str = "SQLSPY_SHOW_TYPE_HINTS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const JSON_LOGS: &str = "SQLSPY_JSON_LOGS";
}

const DUMP_SQL_VARS: [(&str, SqlCategory); 5] = [
    (vars::DUMP_SQL_SELECT, SqlCategory::Select),
    (vars::DUMP_SQL_INSERT, SqlCategory::Insert),
    (vars::DUMP_SQL_UPDATE, SqlCategory::Update),
    (vars::DUMP_SQL_DELETE, SqlCategory::Delete),
    (vars::DUMP_SQL_CREATE, SqlCategory::Create),
];

/// Load configuration from environment variables
///
/// Unparsable numbers are skipped; each value read is noted on the debug
/// channel.
pub fn load_from_env(mut builder: ConfigBuilder) -> ConfigBuilder {
    if let Some(prefix) = read(vars::DEBUG_STACK_PREFIX) {
        builder = builder.debug_stack_prefix(prefix);
    }

    if let Some(ms) = read_number::<u64>(vars::SQLTIMING_WARN_THRESHOLD_MS) {
        builder = builder.sql_timing_warn_threshold(Some(Duration::from_millis(ms)));
    }

    if let Some(ms) = read_number::<u64>(vars::SQLTIMING_ERROR_THRESHOLD_MS) {
        builder = builder.sql_timing_error_threshold(Some(Duration::from_millis(ms)));
    }

    if let Some(enabled) = read_bool(vars::SQLTIMING_USE_MARKERS) {
        builder = builder.sql_timing_use_markers(enabled);
    }

    if let Some(enabled) = read_bool(vars::DUMP_FULL_DEBUG_STACK_TRACE) {
        builder = builder.dump_full_debug_stack_trace(enabled);
    }

    for (var, category) in DUMP_SQL_VARS {
        if let Some(enabled) = read_bool(var) {
            builder = builder.dump_sql(category, enabled);
        }
    }

    if let Some(enabled) = read_bool(vars::DUMP_SQL_REPORT_ORIGINAL) {
        builder = builder.report_original_sql(enabled);
    }

    if let Some(enabled) = read_bool(vars::TRIM_SQL) {
        builder = builder.trim_sql(enabled);
    }

    if let Some(threshold) = read_number::<usize>(vars::CONNECTION_DUMP_THRESHOLD) {
        builder = builder.connection_dump_threshold(threshold);
    }

    if let Some(enabled) = read_bool(vars::SHOW_TYPE_HINTS) {
        builder = builder.show_type_hints(enabled);
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Some(enabled) = read_bool(vars::JSON_LOGS) {
        builder = builder.json_logs(enabled);
    }

    builder
}

fn read(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            tracing::debug!(target: "sqlspy::debug", "  {name} = {value}");
            Some(value)
        }
        Err(_) => {
            tracing::trace!(target: "sqlspy::debug", "x {name} is not defined");
            None
        }
    }
}

/// Empty values count as undefined.
fn read_bool(name: &str) -> Option<bool> {
    read(name)
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_bool(&value))
}

fn read_number<T>(name: &str) -> Option<T>
where
    T: FromStr<Err = ParseIntError>,
{
    let value = read(name)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(target: "sqlspy::debug", "{name} ignored, not a number: {e}");
            None
        }
    }
}

pub(super) fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{Dialect, ParameterFormatter};

/// Oracle: temporal values go through `to_date` / `to_timestamp` so they
/// survive the session's NLS settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleFormatter;

impl OracleFormatter {
    fn to_date(value: NaiveDateTime) -> String {
        format!(
            "to_date('{}', 'mm/dd/yyyy hh24:mi:ss')",
            value.format("%m/%d/%Y %H:%M:%S")
        )
    }
}

impl ParameterFormatter for OracleFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn format_date(&self, date: NaiveDate) -> String {
        Self::to_date(date.and_time(NaiveTime::MIN))
    }

    fn format_time(&self, time: NaiveTime) -> String {
        Self::to_date(NaiveDate::default().and_time(time))
    }

    fn format_timestamp(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "to_timestamp('{}', 'mm/dd/yyyy hh24:mi:ss.ff3')",
            timestamp.format("%m/%d/%Y %H:%M:%S%.3f")
        )
    }
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{Dialect, ParameterFormatter};

/// MySQL and MariaDB: ISO style temporal literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlFormatter;

impl ParameterFormatter for MySqlFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn format_date(&self, date: NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    fn format_time(&self, time: NaiveTime) -> String {
        format!("'{}'", time.format("%H:%M:%S"))
    }

    fn format_timestamp(&self, timestamp: NaiveDateTime) -> String {
        format!("'{}'", timestamp.format("%Y-%m-%d %H:%M:%S"))
    }
}

//! Rendering of bound values as SQL literals.
//!
//! A [`ParameterFormatter`] turns a [`SqlValue`] into text that can be pasted
//! back into a SQL console of a given dialect. The generic rules live in the
//! trait's provided methods; dialects override only the temporal pieces.

mod dialect;
mod generic;
mod mysql;
mod oracle;
mod sqlserver;

use std::fmt::{Debug, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub use dialect::{Dialect, FormatterRegistry};
pub use generic::GenericFormatter;
pub use mysql::MySqlFormatter;
pub use oracle::OracleFormatter;
pub use sqlserver::SqlServerFormatter;

use crate::value::SqlValue;

/// Byte arrays longer than this are not dumped in full.
pub const MAX_DUMPED_BYTES: usize = 48;

/// Dialect specific rendering of bound values.
pub trait ParameterFormatter: Send + Sync + Debug {
    fn dialect(&self) -> Dialect;

    fn format_date(&self, date: NaiveDate) -> String {
        self.format_timestamp(date.and_time(NaiveTime::MIN))
    }

    fn format_time(&self, time: NaiveTime) -> String {
        self.format_timestamp(NaiveDate::default().and_time(time))
    }

    fn format_timestamp(&self, timestamp: NaiveDateTime) -> String {
        format!("'{}'", timestamp.format("%m/%d/%Y %H:%M:%S%.3f"))
    }

    fn format_bool(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_owned()
    }

    /// Render `value` as a literal of this dialect.
    fn format(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_owned(),
            SqlValue::Text(text) => quote(text),
            SqlValue::Url(url) => quote(url.as_str()),
            SqlValue::Bool(b) => self.format_bool(*b),
            SqlValue::Date(date) => self.format_date(*date),
            SqlValue::Time(time) => self.format_time(*time),
            SqlValue::Timestamp(ts) => self.format_timestamp(*ts),
            SqlValue::Bytes(bytes) if bytes.len() <= MAX_DUMPED_BYTES => {
                format!("0x{}", to_hex_upper(bytes))
            }
            other => other.to_string(),
        }
    }
}

/// Format `value`, containing any panic raised by the formatter.
///
/// Returns `None` if the formatter panicked.
pub(crate) fn try_format(formatter: &dyn ParameterFormatter, value: &SqlValue) -> Option<String> {
    catch_unwind(AssertUnwindSafe(|| formatter.format(value))).ok()
}

/// Wrap `text` in single quotes, doubling any embedded quote.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    out.push_str(&escape(text));
    out.push('\'');
    out
}

/// Double every single quote in `text`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out
}

pub fn to_hex_upper(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

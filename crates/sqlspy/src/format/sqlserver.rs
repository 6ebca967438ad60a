use chrono::NaiveDateTime;

use super::{Dialect, ParameterFormatter};

/// SQL Server: temporal values wrapped in `convert(datetime, ...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerFormatter;

impl ParameterFormatter for SqlServerFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn format_timestamp(&self, timestamp: NaiveDateTime) -> String {
        format!(
            "convert(datetime, '{}')",
            timestamp.format("%m/%d/%Y %H:%M:%S%.3f")
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::value::SqlValue;

    #[test]
    fn test_timestamp_uses_convert() {
        let ts = NaiveDate::from_ymd_opt(2019, 11, 2)
            .unwrap()
            .and_hms_milli_opt(1, 2, 3, 450)
            .unwrap();
        assert_eq!(
            SqlServerFormatter.format(&SqlValue::Timestamp(ts)),
            "convert(datetime, '11/02/2019 01:02:03.450')"
        );
    }

    #[test]
    fn test_time_uses_convert_on_epoch_day() {
        let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(
            SqlServerFormatter.format(&SqlValue::Time(time)),
            "convert(datetime, '01/01/1970 12:00:00.000')"
        );
    }

    #[test]
    fn test_booleans_are_bits() {
        assert_eq!(SqlServerFormatter.format(&SqlValue::Bool(false)), "0");
    }
}

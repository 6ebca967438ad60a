use super::{Dialect, ParameterFormatter};

/// Default rules, used for drivers without a registered dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFormatter;

impl ParameterFormatter for GenericFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::value::SqlValue;

    fn fmt(value: SqlValue) -> String {
        GenericFormatter.format(&value)
    }

    #[test]
    fn test_null() {
        assert_eq!(fmt(SqlValue::Null), "NULL");
    }

    #[test]
    fn test_text_is_quoted_and_escaped() {
        assert_eq!(fmt(SqlValue::from("O'Brien")), "'O''Brien'");
    }

    #[test]
    fn test_booleans_are_numeric() {
        assert_eq!(fmt(SqlValue::Bool(true)), "1");
        assert_eq!(fmt(SqlValue::Bool(false)), "0");
    }

    #[test]
    fn test_numbers_use_plain_form() {
        assert_eq!(fmt(SqlValue::Int(42)), "42");
        assert_eq!(fmt(SqlValue::BigInt(-7)), "-7");
        let dec: BigDecimal = "12.50".parse().unwrap();
        assert_eq!(fmt(SqlValue::Decimal(dec)), "12.50");
    }

    #[test]
    fn test_short_bytes_are_hex() {
        assert_eq!(fmt(SqlValue::Bytes(vec![0xde, 0xad, 0x01])), "0xDEAD01");
    }

    #[test]
    fn test_bytes_at_limit_are_hex() {
        let rendered = fmt(SqlValue::Bytes(vec![0xff; 48]));
        assert!(rendered.starts_with("0xFF"));
        assert_eq!(rendered.len(), 2 + 96);
    }

    #[test]
    fn test_long_bytes_are_not_dumped() {
        assert_eq!(fmt(SqlValue::Bytes(vec![1; 49])), "<byte[49]>");
    }

    #[test]
    fn test_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_milli_opt(13, 5, 9, 42)
            .unwrap();
        assert_eq!(fmt(SqlValue::Timestamp(ts)), "'01/31/2024 13:05:09.042'");
    }

    #[test]
    fn test_date_renders_midnight() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 24).unwrap();
        assert_eq!(fmt(SqlValue::Date(date)), "'12/24/2023 00:00:00.000'");
    }

    #[test]
    fn test_time_renders_epoch_day() {
        let time = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(fmt(SqlValue::Time(time)), "'01/01/1970 08:30:00.000'");
    }

    #[test]
    fn test_url_is_quoted() {
        let url = url::Url::parse("http://example.com/a").unwrap();
        assert_eq!(fmt(SqlValue::Url(url)), "'http://example.com/a'");
    }
}

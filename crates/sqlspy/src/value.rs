//! Values bound to statements and read back from result sets.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

/// A single SQL value as exchanged with a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Decimal(BigDecimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Url(Url),
    /// Driver specific value (arrays, refs, row ids) carried as its display form.
    Other { type_name: String, repr: String },
}

impl SqlValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type annotation comment used when type hints are enabled, e.g. `/*<int>*/`.
    #[must_use]
    pub fn type_hint(&self) -> String {
        let name = match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::TinyInt(_) => "byte",
            Self::SmallInt(_) => "short",
            Self::Int(_) => "int",
            Self::BigInt(_) => "long",
            Self::Real(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "BigDecimal",
            Self::Text(_) => "String",
            Self::Bytes(_) => "byte[]",
            Self::Date(_) => "Date",
            Self::Time(_) => "Time",
            Self::Timestamp(_) => "Timestamp",
            Self::Url(_) => "URL",
            Self::Other { type_name, .. } => type_name,
        };
        format!("/*<{name}>*/")
    }
}

/// Plain rendering, used whenever a dialect formatter is not involved.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bytes(v) => write!(f, "<byte[{}]>", v.len()),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Time(v) => write!(f, "{}", v.format("%H:%M:%S")),
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Url(v) => f.write_str(v.as_str()),
            Self::Other { repr, .. } => f.write_str(repr),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Real,
    f64 => Double,
    BigDecimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    Url => Url,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// SQL type codes used when registering out parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SqlType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Varchar,
    Clob,
    Binary,
    Blob,
    Date,
    Time,
    Timestamp,
    RefCursor,
    /// Vendor type code.
    Other(i32),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::SmallInt => f.write_str("SMALLINT"),
            Self::Integer => f.write_str("INTEGER"),
            Self::BigInt => f.write_str("BIGINT"),
            Self::Real => f.write_str("REAL"),
            Self::Double => f.write_str("DOUBLE"),
            Self::Decimal => f.write_str("DECIMAL"),
            Self::Varchar => f.write_str("VARCHAR"),
            Self::Clob => f.write_str("CLOB"),
            Self::Binary => f.write_str("BINARY"),
            Self::Blob => f.write_str("BLOB"),
            Self::Date => f.write_str("DATE"),
            Self::Time => f.write_str("TIME"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::RefCursor => f.write_str("REF_CURSOR"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Kind of streamed parameter, used to describe stream bindings in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Ascii,
    Binary,
    Character,
    Unicode,
    Blob,
    Clob,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascii => "Ascii InputStream",
            Self::Binary => "Binary InputStream",
            Self::Character => "Reader",
            Self::Unicode => "Unicode InputStream",
            Self::Blob => "Blob",
            Self::Clob => "Clob",
        })
    }
}

//! Dialect selection by driver name.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{
    GenericFormatter, MySqlFormatter, OracleFormatter, ParameterFormatter, SqlServerFormatter,
};
use crate::error::SpyError;

/// SQL dialects with a built-in formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Generic,
    Oracle,
    MySql,
    SqlServer,
}

impl Dialect {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Oracle => "oracle",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
        }
    }

    #[must_use]
    pub fn formatter(self) -> Arc<dyn ParameterFormatter> {
        match self {
            Self::Generic => Arc::new(GenericFormatter),
            Self::Oracle => Arc::new(OracleFormatter),
            Self::MySql => Arc::new(MySqlFormatter),
            Self::SqlServer => Arc::new(SqlServerFormatter),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = SpyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "default" => Ok(Self::Generic),
            "oracle" => Ok(Self::Oracle),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            other => Err(SpyError::Config(format!("Unknown SQL dialect: {other}"))),
        }
    }
}

/// Driver names known out of the box.
const BUILTIN_DRIVERS: &[(&str, Dialect)] = &[
    ("oracle", Dialect::Oracle),
    ("mysql", Dialect::MySql),
    ("mariadb", Dialect::MySql),
    ("sqlserver", Dialect::SqlServer),
    ("mssql", Dialect::SqlServer),
    ("jtds", Dialect::SqlServer),
];

/// Maps driver names to formatters; unknown names get the generic one.
///
/// Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct FormatterRegistry {
    by_driver: HashMap<String, Arc<dyn ParameterFormatter>>,
    fallback: Arc<dyn ParameterFormatter>,
}

impl FormatterRegistry {
    /// Registry populated with the built-in driver names.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (driver, dialect) in BUILTIN_DRIVERS {
            registry.register_dialect(*driver, *dialect);
        }
        registry
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_driver: HashMap::new(),
            fallback: Arc::new(GenericFormatter),
        }
    }

    pub fn register_dialect(&mut self, driver: impl AsRef<str>, dialect: Dialect) {
        self.register(driver, dialect.formatter());
    }

    /// Register a custom formatter for a driver name.
    pub fn register(&mut self, driver: impl AsRef<str>, formatter: Arc<dyn ParameterFormatter>) {
        self.by_driver
            .insert(driver.as_ref().to_lowercase(), formatter);
    }

    /// Formatter registered for `driver`, if any.
    #[must_use]
    pub fn lookup(&self, driver: &str) -> Option<Arc<dyn ParameterFormatter>> {
        self.by_driver.get(&driver.to_lowercase()).map(Arc::clone)
    }

    #[must_use]
    pub fn resolve(&self, driver: &str) -> Arc<dyn ParameterFormatter> {
        self.lookup(driver)
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_driver.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_driver.is_empty()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

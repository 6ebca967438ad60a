//! First-keyword SQL classification for dump filtering.

use std::fmt;

/// Statement categories that can be dumped or suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlCategory {
    Select,
    Insert,
    Update,
    Delete,
    Create,
}

impl SqlCategory {
    /// Classify by the first six characters after leading whitespace.
    #[must_use]
    pub fn from_sql(sql: &str) -> Option<Self> {
        let keyword = sql.trim().get(..6)?.to_ascii_lowercase();
        match keyword.as_str() {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "create" => Some(Self::Create),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }
}

impl fmt::Display for SqlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which SQL categories are dumped to the sql-only and sql-timing channels.
///
/// Filtering is active as soon as one category is disabled; then only
/// statements of an enabled category pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlFilter {
    pub select: bool,
    pub insert: bool,
    pub update: bool,
    pub delete: bool,
    pub create: bool,
}

impl SqlFilter {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            select: true,
            insert: true,
            update: true,
            delete: true,
            create: true,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self {
            select: false,
            insert: false,
            update: false,
            delete: false,
            create: false,
        }
    }

    #[must_use]
    pub const fn with(mut self, category: SqlCategory, enabled: bool) -> Self {
        match category {
            SqlCategory::Select => self.select = enabled,
            SqlCategory::Insert => self.insert = enabled,
            SqlCategory::Update => self.update = enabled,
            SqlCategory::Delete => self.delete = enabled,
            SqlCategory::Create => self.create = enabled,
        }
        self
    }

    #[must_use]
    pub const fn is_enabled(&self, category: SqlCategory) -> bool {
        match category {
            SqlCategory::Select => self.select,
            SqlCategory::Insert => self.insert,
            SqlCategory::Update => self.update,
            SqlCategory::Delete => self.delete,
            SqlCategory::Create => self.create,
        }
    }

    #[must_use]
    pub const fn is_filtering(&self) -> bool {
        !(self.select && self.insert && self.update && self.delete && self.create)
    }

    /// Whether `sql` should be dumped.
    #[must_use]
    pub fn allows(&self, sql: &str) -> bool {
        if !self.is_filtering() {
            return true;
        }
        SqlCategory::from_sql(sql).is_some_and(|category| self.is_enabled(category))
    }
}

impl Default for SqlFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(SqlCategory::from_sql("  SELECT * from t"), Some(SqlCategory::Select));
        assert_eq!(SqlCategory::from_sql("insert into t"), Some(SqlCategory::Insert));
        assert_eq!(SqlCategory::from_sql("\nUpDaTe t set"), Some(SqlCategory::Update));
        assert_eq!(SqlCategory::from_sql("delete from t"), Some(SqlCategory::Delete));
        assert_eq!(SqlCategory::from_sql("create table t"), Some(SqlCategory::Create));
        assert_eq!(SqlCategory::from_sql("merge into t"), None);
    }

    #[test]
    fn test_short_statements_are_unclassified() {
        assert_eq!(SqlCategory::from_sql("do"), None);
        assert_eq!(SqlCategory::from_sql("  selec  "), None);
    }

    #[test]
    fn test_non_ascii_prefix_is_unclassified() {
        assert_eq!(SqlCategory::from_sql("séléct * from t"), None);
    }

    #[test]
    fn test_all_enabled_is_not_filtering() {
        let filter = SqlFilter::all();
        assert!(!filter.is_filtering());
        assert!(filter.allows("do"));
        assert!(filter.allows("merge into t"));
    }

    #[test]
    fn test_insert_only() {
        let filter = SqlFilter::none().with(SqlCategory::Insert, true);
        assert!(filter.is_filtering());
        assert!(filter.allows("INSERT INTO t VALUES (1)"));
        assert!(!filter.allows("SELECT * FROM t"));
        assert!(!filter.allows("do"));
    }

    #[test]
    fn test_single_category_disabled() {
        let filter = SqlFilter::all().with(SqlCategory::Select, false);
        assert!(filter.is_filtering());
        assert!(!filter.allows("select 1"));
        assert!(filter.allows("delete from t"));
        assert!(!filter.allows("call proc()"));
    }
}

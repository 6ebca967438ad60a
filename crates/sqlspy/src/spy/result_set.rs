use std::any::Any;
use std::fmt;

use super::SpyCore;
use crate::api::{Capability, ResultSet, Wrapper};
use crate::error::SqlResult;
use crate::value::SqlValue;

/// Result set handle reporting every cursor movement and value read.
///
/// Returns go to the result set channel, which is usually left off: it is
/// by far the noisiest one.
pub struct ResultSetSpy {
    core: SpyCore,
    delegate: Box<dyn ResultSet>,
}

impl fmt::Debug for ResultSetSpy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSetSpy")
            .field("connection", &self.core.connection_number())
            .finish_non_exhaustive()
    }
}

impl ResultSetSpy {
    #[track_caller]
    pub(crate) fn new(core: SpyCore, delegate: Box<dyn ResultSet>) -> Self {
        core.report_return("new ResultSet", "");
        Self { core, delegate }
    }

    pub fn connection_number(&self) -> u64 {
        self.core.connection_number()
    }

    /// The real result set.
    pub fn delegate(&self) -> &dyn ResultSet {
        self.delegate.as_ref()
    }
}

impl Wrapper for ResultSetSpy {
    #[track_caller]
    fn is_wrapper_for(&self, capability: &Capability) -> SqlResult<bool> {
        let method = format!("is_wrapper_for({capability})");
        if matches!(capability, Capability::ResultSet | Capability::Spy) {
            return self.core.invoke(&method, || Ok(true));
        }
        self.core
            .invoke(&method, || self.delegate.is_wrapper_for(capability))
    }

    #[track_caller]
    fn unwrap_for(&self, capability: &Capability) -> SqlResult<&dyn Any> {
        let method = format!("unwrap_for({capability})");
        if matches!(capability, Capability::ResultSet | Capability::Spy) {
            self.core.report_return(&method, "ResultSet");
            return Ok(self);
        }
        match self.delegate.unwrap_for(capability) {
            Ok(inner) => {
                self.core.report_return(&method, &capability.to_string());
                Ok(inner)
            }
            Err(error) => {
                self.core.report_failure(&method, &error);
                Err(error)
            }
        }
    }
}

impl ResultSet for ResultSetSpy {
    #[track_caller]
    fn next(&mut self) -> SqlResult<bool> {
        self.core.invoke("next()", || self.delegate.next())
    }

    #[track_caller]
    fn previous(&mut self) -> SqlResult<bool> {
        self.core.invoke("previous()", || self.delegate.previous())
    }

    #[track_caller]
    fn first(&mut self) -> SqlResult<bool> {
        self.core.invoke("first()", || self.delegate.first())
    }

    #[track_caller]
    fn last(&mut self) -> SqlResult<bool> {
        self.core.invoke("last()", || self.delegate.last())
    }

    #[track_caller]
    fn before_first(&mut self) -> SqlResult<()> {
        self.core
            .invoke("before_first()", || self.delegate.before_first())
    }

    #[track_caller]
    fn after_last(&mut self) -> SqlResult<()> {
        self.core
            .invoke("after_last()", || self.delegate.after_last())
    }

    #[track_caller]
    fn absolute(&mut self, row: i64) -> SqlResult<bool> {
        let method = format!("absolute({row})");
        self.core.invoke(&method, || self.delegate.absolute(row))
    }

    #[track_caller]
    fn relative(&mut self, rows: i64) -> SqlResult<bool> {
        let method = format!("relative({rows})");
        self.core.invoke(&method, || self.delegate.relative(rows))
    }

    #[track_caller]
    fn row(&self) -> SqlResult<u64> {
        self.core.invoke("row()", || self.delegate.row())
    }

    #[track_caller]
    fn get_value(&mut self, column: usize) -> SqlResult<SqlValue> {
        let method = format!("get_value({column})");
        self.core.invoke(&method, || self.delegate.get_value(column))
    }

    #[track_caller]
    fn get_value_by_label(&mut self, label: &str) -> SqlResult<SqlValue> {
        let method = format!("get_value_by_label({label})");
        self.core
            .invoke(&method, || self.delegate.get_value_by_label(label))
    }

    #[track_caller]
    fn find_column(&self, label: &str) -> SqlResult<usize> {
        let method = format!("find_column({label})");
        self.core
            .invoke(&method, || self.delegate.find_column(label))
    }

    #[track_caller]
    fn column_count(&self) -> SqlResult<usize> {
        self.core
            .invoke("column_count()", || self.delegate.column_count())
    }

    #[track_caller]
    fn was_null(&self) -> SqlResult<bool> {
        self.core.invoke("was_null()", || self.delegate.was_null())
    }

    #[track_caller]
    fn set_fetch_size(&mut self, rows: u32) -> SqlResult<()> {
        let method = format!("set_fetch_size({rows})");
        self.core
            .invoke(&method, || self.delegate.set_fetch_size(rows))
    }

    #[track_caller]
    fn fetch_size(&self) -> SqlResult<u32> {
        self.core.invoke("fetch_size()", || self.delegate.fetch_size())
    }

    #[track_caller]
    fn close(&mut self) -> SqlResult<()> {
        self.core.invoke("close()", || self.delegate.close())
    }

    #[track_caller]
    fn is_closed(&self) -> SqlResult<bool> {
        self.core.invoke("is_closed()", || self.delegate.is_closed())
    }
}

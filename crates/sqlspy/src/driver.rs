//! Driver facade that hands out spied connections.

use std::fmt;
use std::sync::Arc;

use crate::api::{Connection, Driver, Properties};
use crate::context::SpyContext;
use crate::error::{SqlError, SqlResult};
use crate::format::ParameterFormatter;
use crate::spy::ConnectionSpy;

/// Optional URL prefix selecting the proxy explicitly, e.g. `spy:mem:test`.
pub const URL_PREFIX: &str = "spy:";

/// Proxy driver over a list of real drivers.
///
/// URLs are matched against the registered drivers in registration order,
/// with or without the [`URL_PREFIX`]. The first driver accepting the URL
/// opens the connection, which is then wrapped in a [`ConnectionSpy`]
/// unless no reporting channel is enabled at all.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sqlspy::{SpyConfig, SpyContext, SpyDriver};
///
/// let context = Arc::new(SpyContext::with_tracing(SpyConfig::default()));
/// let mut driver = SpyDriver::new(context);
/// driver.register(Arc::new(my_driver));
/// let conn = driver.connect("spy:postgres://localhost/app", &Default::default())?;
/// ```
pub struct SpyDriver {
    context: Arc<SpyContext>,
    drivers: Vec<Arc<dyn Driver>>,
}

impl fmt::Debug for SpyDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.drivers.iter().map(|driver| driver.name()).collect();
        f.debug_struct("SpyDriver")
            .field("drivers", &names)
            .finish_non_exhaustive()
    }
}

impl SpyDriver {
    #[must_use]
    pub const fn new(context: Arc<SpyContext>) -> Self {
        Self {
            context,
            drivers: Vec::new(),
        }
    }

    /// Add a real driver. Earlier registrations win on overlapping URLs.
    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.context
            .reporter()
            .debug(&format!("  registered driver {}", driver.name()));
        self.drivers.push(driver);
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SpyContext> {
        &self.context
    }

    /// Registered driver accepting `url`, with the prefix already stripped.
    fn underlying(&self, url: &str) -> Option<&Arc<dyn Driver>> {
        let url = strip_prefix(url);
        self.drivers.iter().find(|driver| driver.accepts_url(url))
    }

    /// Formatter by driver name, then by the name the connection reports.
    fn formatter_for(
        &self,
        driver: &dyn Driver,
        connection: &dyn Connection,
    ) -> Arc<dyn ParameterFormatter> {
        let formatters = self.context.formatters();
        if let Some(formatter) = formatters.lookup(driver.name()) {
            return formatter;
        }
        connection
            .driver_name()
            .ok()
            .and_then(|name| formatters.lookup(&name))
            .unwrap_or_else(|| formatters.resolve(driver.name()))
    }
}

fn strip_prefix(url: &str) -> &str {
    url.strip_prefix(URL_PREFIX).unwrap_or(url)
}

impl Driver for SpyDriver {
    fn name(&self) -> &str {
        "sqlspy"
    }

    fn accepts_url(&self, url: &str) -> bool {
        self.underlying(url).is_some()
    }

    #[track_caller]
    fn connect(
        &self,
        url: &str,
        properties: &Properties,
    ) -> SqlResult<Option<Box<dyn Connection>>> {
        let Some(driver) = self.underlying(url) else {
            return Ok(None);
        };
        let target = strip_prefix(url);
        let Some(connection) = driver.connect(target, properties)? else {
            return Err(SqlError::invalid_url(target));
        };

        if !self.context.reporter().is_logging_enabled() {
            return Ok(Some(connection));
        }

        let formatter = self.formatter_for(driver.as_ref(), connection.as_ref());
        self.context.reporter().debug(&format!(
            "  {} connection uses the {} dialect",
            driver.name(),
            formatter.dialect()
        ));
        Ok(Some(Box::new(ConnectionSpy::new(
            Arc::clone(&self.context),
            connection,
            formatter,
            driver.name(),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;
    use crate::api::Capability;
    use crate::config::SpyConfig;
    use crate::format::Dialect;
    use crate::report::{Channel, LogSink};
    use crate::testing::{MemoryDriver, RecordingSink};

    fn spy_driver(sink: &Arc<RecordingSink>, config: SpyConfig) -> SpyDriver {
        let context = Arc::new(SpyContext::new(
            config,
            Arc::clone(sink) as Arc<dyn LogSink>,
        ));
        SpyDriver::new(context)
    }

    #[test]
    fn test_prefix_is_optional() {
        let sink = Arc::new(RecordingSink::new());
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(MemoryDriver::new()));
        assert!(driver.accepts_url("mem:test"));
        assert!(driver.accepts_url("spy:mem:test"));
        assert!(!driver.accepts_url("spy:postgres://localhost"));
    }

    #[test]
    fn test_unknown_url_is_not_ours() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::INFO));
        let driver = spy_driver(&sink, SpyConfig::default());
        assert!(driver.connect("mem:test", &Properties::new()).unwrap().is_none());
    }

    #[test]
    fn test_declining_driver_is_an_invalid_url() {
        let sink = Arc::new(RecordingSink::new().with_all(Level::INFO));
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(MemoryDriver::new().declining()));
        let err = driver
            .connect("spy:mem:test", &Properties::new())
            .err()
            .unwrap();
        assert!(err.is_invalid_url());
        assert_eq!(err.to_string(), "invalid or unknown driver url: mem:test");
    }

    #[test]
    fn test_kill_switch_returns_raw_connection() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::Debug, Level::DEBUG));
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(MemoryDriver::new()));
        let conn = driver
            .connect("spy:mem:test", &Properties::new())
            .unwrap()
            .unwrap();
        assert!(!conn.is_wrapper_for(&Capability::Spy).unwrap());
        assert_eq!(driver.context().registry().open_connection_count(), 0);
    }

    #[test]
    fn test_enabled_channel_yields_spy() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::SqlTiming, Level::ERROR));
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(MemoryDriver::new()));
        let conn = driver
            .connect("mem:test", &Properties::new())
            .unwrap()
            .unwrap();
        assert!(conn.is_wrapper_for(&Capability::Spy).unwrap());
        assert_eq!(driver.context().registry().open_connection_count(), 1);
    }

    #[test]
    fn test_first_registered_driver_wins() {
        let sink = Arc::new(RecordingSink::new().with_level(Channel::Audit, Level::ERROR));
        let first = MemoryDriver::named("first");
        let second = MemoryDriver::named("second");
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(first.clone()));
        driver.register(Arc::new(second.clone()));

        let mut conn = driver
            .connect("mem:test", &Properties::new())
            .unwrap()
            .unwrap();
        conn.commit().unwrap();
        assert_eq!(first.executed(), vec!["COMMIT"]);
        assert!(second.executed().is_empty());
    }

    #[test]
    fn test_dialect_follows_driver_name() {
        let sink = Arc::new(
            RecordingSink::new()
                .with_level(Channel::Audit, Level::ERROR)
                .with_level(Channel::Debug, Level::DEBUG),
        );
        let config = SpyConfig::builder().dialect("memory", Dialect::Oracle).build();
        let mut driver = spy_driver(&sink, config);
        driver.register(Arc::new(MemoryDriver::new()));
        driver.connect("mem:test", &Properties::new()).unwrap();

        let debug = sink.messages(Channel::Debug);
        assert!(debug.contains(&"  memory connection uses the oracle dialect".to_owned()));
    }

    #[test]
    fn test_unknown_driver_gets_generic_dialect() {
        let sink = Arc::new(
            RecordingSink::new()
                .with_level(Channel::Audit, Level::ERROR)
                .with_level(Channel::Debug, Level::DEBUG),
        );
        let mut driver = spy_driver(&sink, SpyConfig::default());
        driver.register(Arc::new(MemoryDriver::named("h2")));
        driver.connect("mem:test", &Properties::new()).unwrap();

        let debug = sink.messages(Channel::Debug);
        assert!(debug.contains(&"  h2 connection uses the generic dialect".to_owned()));
    }
}

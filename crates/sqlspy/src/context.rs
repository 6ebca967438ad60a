//! Shared state of one proxy instance.

use std::sync::Arc;

use crate::config::SpyConfig;
use crate::format::FormatterRegistry;
use crate::registry::ConnectionRegistry;
use crate::report::{LogSink, Reporter, TracingSink};

/// Everything a spied handle needs besides its delegate.
///
/// Built once and shared by every connection the proxy opens; the
/// connection counter and registry live here instead of in globals.
#[derive(Debug)]
pub struct SpyContext {
    config: SpyConfig,
    reporter: Reporter,
    registry: ConnectionRegistry,
    formatters: FormatterRegistry,
}

impl SpyContext {
    pub fn new(config: SpyConfig, sink: Arc<dyn LogSink>) -> Self {
        let reporter = Reporter::new(sink, &config);
        let registry = ConnectionRegistry::new(config.connection_dump_threshold);

        let mut formatters = FormatterRegistry::new();
        for (driver, dialect) in &config.dialects {
            reporter.debug(&format!("    {driver} uses the {dialect} dialect"));
            formatters.register_dialect(driver, *dialect);
        }

        Self {
            config,
            reporter,
            registry,
            formatters,
        }
    }

    /// Context reporting through `tracing`.
    pub fn with_tracing(config: SpyConfig) -> Self {
        Self::new(config, Arc::new(TracingSink::new()))
    }

    #[must_use]
    pub const fn config(&self) -> &SpyConfig {
        &self.config
    }

    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }
}

//! Subscriber setup and optional metrics.

use crate::Result;
use crate::config::LoggingConfig;
use crate::error::SpyError;

#[cfg(feature = "metrics")]
pub use self::metrics::{
    describe_metrics, record_connection_closed, record_connection_opened, record_sql,
};

/// Install a global `tracing` subscriber for the sqlspy channels.
///
/// `RUST_LOG` wins over `config.log_level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| SpyError::Logging(e.to_string()))
}

#[cfg(feature = "metrics")]
mod metrics {
    use std::time::Duration;

    use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

    use crate::report::SqlCategory;

    const METRIC_SQL_DURATION: &str = "sqlspy_sql_duration_seconds";
    const METRIC_SQL_TOTAL: &str = "sqlspy_sql_total";
    const METRIC_OPEN_CONNECTIONS: &str = "sqlspy_open_connections";

    /// Register metric descriptions with the installed recorder.
    pub fn describe_metrics() {
        describe_histogram!(METRIC_SQL_DURATION, "SQL execution duration in seconds");
        describe_counter!(METRIC_SQL_TOTAL, "Total SQL executions seen by the proxy");
        describe_gauge!(METRIC_OPEN_CONNECTIONS, "Spied connections currently open");
    }

    /// Record one SQL execution.
    pub fn record_sql(category: Option<SqlCategory>, duration: Duration, succeeded: bool) {
        let category = category.map_or("other", |c| c.as_str());
        let status = if succeeded { "success" } else { "error" };

        histogram!(METRIC_SQL_DURATION, "category" => category).record(duration.as_secs_f64());
        counter!(
            METRIC_SQL_TOTAL,
            "category" => category,
            "status" => status,
        )
        .increment(1);
    }

    pub fn record_connection_opened() {
        gauge!(METRIC_OPEN_CONNECTIONS).increment(1.0);
    }

    pub fn record_connection_closed() {
        gauge!(METRIC_OPEN_CONNECTIONS).decrement(1.0);
    }

}

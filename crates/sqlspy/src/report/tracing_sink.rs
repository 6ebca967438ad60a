//! [`LogSink`] backed by `tracing`.
//!
//! Each channel is a `tracing` target, so channel levels are set with the
//! usual filter directives, e.g.
//! `RUST_LOG=sqlspy::sqltiming=info,sqlspy::connection=debug`.

use tracing::Level;

use super::sink::{Channel, LogSink, Record};

/// Sink emitting every record as a `tracing` event under its channel target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

// `tracing` needs the target and level as constants at every call site,
// hence one expansion per channel and level.
macro_rules! emit_event {
    ($target:literal, $level:expr, $record:expr) => {{
        let record = $record;
        match (record.marker, record.error) {
            (Some(marker), _) => tracing::event!(
                target: $target,
                $level,
                sql = %marker.sql,
                executed_in_nanos = marker.executed_in_nanos,
                "{}",
                record.message
            ),
            (None, Some(error)) => tracing::event!(
                target: $target,
                $level,
                error = %error,
                sql_state = error.sql_state(),
                "{}",
                record.message
            ),
            (None, None) => tracing::event!(target: $target, $level, "{}", record.message),
        }
    }};
}

macro_rules! emit_at_level {
    ($target:literal, $record:expr) => {{
        let record = $record;
        if record.level == Level::ERROR {
            emit_event!($target, Level::ERROR, record);
        } else if record.level == Level::WARN {
            emit_event!($target, Level::WARN, record);
        } else if record.level == Level::INFO {
            emit_event!($target, Level::INFO, record);
        } else if record.level == Level::DEBUG {
            emit_event!($target, Level::DEBUG, record);
        } else {
            emit_event!($target, Level::TRACE, record);
        }
    }};
}

macro_rules! enabled_at_level {
    ($target:literal, $level:expr) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::enabled!(target: $target, Level::ERROR)
        } else if level == Level::WARN {
            tracing::enabled!(target: $target, Level::WARN)
        } else if level == Level::INFO {
            tracing::enabled!(target: $target, Level::INFO)
        } else if level == Level::DEBUG {
            tracing::enabled!(target: $target, Level::DEBUG)
        } else {
            tracing::enabled!(target: $target, Level::TRACE)
        }
    }};
}

macro_rules! per_channel {
    ($channel:expr, $mac:ident, $arg:expr) => {
        match $channel {
            Channel::Audit => $mac!("sqlspy::audit", $arg),
            Channel::ResultSet => $mac!("sqlspy::resultset", $arg),
            Channel::SqlOnly => $mac!("sqlspy::sqlonly", $arg),
            Channel::SqlTiming => $mac!("sqlspy::sqltiming", $arg),
            Channel::Connection => $mac!("sqlspy::connection", $arg),
            Channel::Debug => $mac!("sqlspy::debug", $arg),
        }
    };
}

impl LogSink for TracingSink {
    fn enabled(&self, channel: Channel, level: Level) -> bool {
        per_channel!(channel, enabled_at_level, level)
    }

    fn log(&self, record: &Record<'_>) {
        per_channel!(record.channel, emit_at_level, record);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::error::SqlError;
    use crate::report::TimingMarker;

    /// Collects the target of every event.
    #[derive(Clone, Default)]
    struct TargetCapture(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for TargetCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().push(event.metadata().target().to_owned());
        }
    }

    #[test]
    fn test_events_use_channel_targets() {
        let capture = TargetCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingSink::new();
            for channel in Channel::ALL {
                assert!(sink.enabled(channel, Level::TRACE));
                sink.log(&Record {
                    channel,
                    level: Level::INFO,
                    message: "select 1",
                    marker: None,
                    error: None,
                });
            }
        });

        let expected: Vec<String> = Channel::ALL
            .iter()
            .map(|channel| channel.target().to_owned())
            .collect();
        assert_eq!(*capture.0.lock(), expected);
    }

    #[test]
    fn test_disabled_without_subscriber() {
        let sink = TracingSink::new();
        for channel in Channel::ALL {
            assert!(!sink.enabled(channel, Level::ERROR));
        }
    }

    #[test]
    fn test_log_without_subscriber_is_noop() {
        let sink = TracingSink::new();
        let marker = TimingMarker {
            sql: "select 1".into(),
            executed_in_nanos: 10,
        };
        let error = SqlError::database("boom");
        sink.log(&Record {
            channel: Channel::SqlTiming,
            level: Level::WARN,
            message: "select 1 {executed in 10 nanoSec}",
            marker: Some(&marker),
            error: None,
        });
        sink.log(&Record {
            channel: Channel::Audit,
            level: Level::ERROR,
            message: "1. Statement.execute()",
            marker: None,
            error: Some(&error),
        });
    }

    #[test]
    fn test_enabled_under_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("sqlspy::sqltiming=info")
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingSink::new();
            assert!(sink.enabled(Channel::SqlTiming, Level::INFO));
            assert!(sink.enabled(Channel::SqlTiming, Level::ERROR));
            assert!(!sink.enabled(Channel::SqlTiming, Level::DEBUG));
            assert!(!sink.enabled(Channel::Audit, Level::ERROR));
        });
    }
}

//! TOML configuration file loading

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::format::Dialect;
use crate::report::SqlCategory;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./sqlspy.toml",
    "~/.config/sqlspy/config.toml",
    "/etc/sqlspy/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SpyError::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::SpyError::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(debug) = config.debug {
        if let Some(prefix) = debug.stack_prefix {
            builder = builder.debug_stack_prefix(prefix);
        }

        if let Some(full) = debug.full_stack_trace {
            builder = builder.dump_full_debug_stack_trace(full);
        }
    }

    if let Some(timing) = config.sqltiming {
        if let Some(ms) = timing.warn_threshold_ms {
            builder = builder.sql_timing_warn_threshold(Some(Duration::from_millis(ms)));
        }

        if let Some(ms) = timing.error_threshold_ms {
            builder = builder.sql_timing_error_threshold(Some(Duration::from_millis(ms)));
        }

        if let Some(markers) = timing.use_markers {
            builder = builder.sql_timing_use_markers(markers);
        }
    }

    if let Some(dump) = config.dump {
        let categories = [
            (dump.select, SqlCategory::Select),
            (dump.insert, SqlCategory::Insert),
            (dump.update, SqlCategory::Update),
            (dump.delete, SqlCategory::Delete),
            (dump.create, SqlCategory::Create),
        ];
        for (enabled, category) in categories {
            if let Some(enabled) = enabled {
                builder = builder.dump_sql(category, enabled);
            }
        }

        if let Some(original) = dump.report_original {
            builder = builder.report_original_sql(original);
        }

        if let Some(trim) = dump.trim_sql {
            builder = builder.trim_sql(trim);
        }

        if let Some(hints) = dump.show_type_hints {
            builder = builder.show_type_hints(hints);
        }
    }

    if let Some(connections) = config.connections
        && let Some(threshold) = connections.dump_threshold
    {
        builder = builder.connection_dump_threshold(threshold);
    }

    if let Some(dialects) = config.dialects {
        for (driver, name) in dialects {
            let dialect: Dialect = name.parse().map_err(|_| {
                crate::SpyError::Config(format!(
                    "Unknown dialect '{name}' for driver '{driver}'"
                ))
            })?;
            builder = builder.dialect(driver, dialect);
        }
    }

    if let Some(logging) = config.logging {
        if let Some(level) = logging.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = logging.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    debug: Option<DebugConfig>,
    sqltiming: Option<SqlTimingConfig>,
    dump: Option<DumpConfig>,
    connections: Option<ConnectionsConfig>,
    dialects: Option<BTreeMap<String, String>>,
    logging: Option<LoggingFileConfig>,
}

#[derive(Debug, Deserialize)]
struct DebugConfig {
    stack_prefix: Option<String>,
    full_stack_trace: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SqlTimingConfig {
    warn_threshold_ms: Option<u64>,
    error_threshold_ms: Option<u64>,
    use_markers: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DumpConfig {
    select: Option<bool>,
    insert: Option<bool>,
    update: Option<bool>,
    delete: Option<bool>,
    create: Option<bool>,
    report_original: Option<bool>,
    trim_sql: Option<bool>,
    show_type_hints: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ConnectionsConfig {
    dump_threshold: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LoggingFileConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[debug]
stack_prefix = "billing::"
full_stack_trace = true

[sqltiming]
warn_threshold_ms = 200
error_threshold_ms = 2000
use_markers = true

[dump]
select = false
report_original = true
trim_sql = false
show_type_hints = true

[connections]
dump_threshold = 40

[dialects]
h2 = "mysql"

[logging]
log_level = "sqlspy::sqltiming=debug"
json_logs = true
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();
        assert!(config.debug.is_some());
        assert!(config.sqltiming.is_some());
        assert!(config.dump.is_some());
        assert!(config.connections.is_some());
        assert!(config.logging.is_some());

        let dump = config.dump.unwrap();
        assert_eq!(dump.select, Some(false));
        assert_eq!(dump.insert, None);
        assert_eq!(
            config.dialects.unwrap().get("h2").map(String::as_str),
            Some("mysql")
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.debug.is_none());
        assert!(config.dialects.is_none());
    }

    #[test]
    fn test_load_from_file_success() {
        let toml_content = r#"
[sqltiming]
warn_threshold_ms = 150

[dump]
delete = false

[connections]
dump_threshold = 12

[dialects]
h2 = "oracle"
"#;
        let temp_file = create_temp_config(toml_content);

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build();

        assert_eq!(config.timing.warn_threshold, Some(Duration::from_millis(150)));
        assert!(config.timing.error_threshold.is_none());
        assert!(!config.sql_filter.delete);
        assert!(config.sql_filter.select);
        assert_eq!(config.connection_dump_threshold, 12);
        assert_eq!(config.dialects, vec![("h2".to_owned(), Dialect::Oracle)]);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(
            Path::new("/nonexistent/path/config.toml"),
            ConfigBuilder::new(),
        );
        let err = result.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");

        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_file_unknown_dialect() {
        let temp_file = create_temp_config("[dialects]\nh2 = \"cobol\"\n");

        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Unknown dialect 'cobol'"));
    }
}

//! Configuration management
//!
//! Supports configuration loading with precedence: env > file > defaults

mod builder;
mod env;
mod file;

pub use builder::{ConfigBuilder, LoggingConfig, SpyConfig, TimingConfig};
pub use file::find_config_file;

use crate::Result;

/// Load configuration with precedence: env > file > defaults
pub fn load_config() -> Result<ConfigBuilder> {
    let mut builder = ConfigBuilder::new();

    if let Some(path) = file::find_config_file() {
        tracing::info!(target: "sqlspy::debug", "Loading configuration from {}", path.display());
        builder = file::load_from_file(&path, builder)?;
    }

    Ok(env::load_from_env(builder))
}

/// Load configuration from a specific file path
pub fn load_config_from_path(path: &std::path::Path) -> Result<ConfigBuilder> {
    let builder = file::load_from_file(path, ConfigBuilder::new())?;
    Ok(env::load_from_env(builder))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::config::env::tests::with_env_vars;

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[sqltiming]\nwarn_threshold_ms = 100\nerror_threshold_ms = 900\n")
            .unwrap();
        file.flush().unwrap();

        let config = with_env_vars(&[("SQLSPY_SQLTIMING_WARN_THRESHOLD_MS", "300")], || {
            load_config_from_path(file.path()).unwrap().build()
        });

        assert_eq!(config.timing.warn_threshold, Some(Duration::from_millis(300)));
        assert_eq!(config.timing.error_threshold, Some(Duration::from_millis(900)));
    }

    #[test]
    fn test_load_config_from_missing_path() {
        let result = load_config_from_path(std::path::Path::new("/nonexistent/sqlspy.toml"));
        assert!(result.is_err());
    }
}

//! Global subscriber installation. Kept in its own test binary: the
//! subscriber is process-wide and can only be installed once.

use std::sync::Arc;

use sqlspy::testing::MemoryDriver;
use sqlspy::{
    Connection, Driver, LoggingConfig, Properties, SpyConfig, SpyContext, SpyDriver, Statement,
    init_logging,
};

#[test]
fn test_init_logging_once_then_drive_traffic() {
    let config = LoggingConfig {
        log_level: "sqlspy=debug".to_owned(),
        json_logs: true,
    };
    init_logging(&config).unwrap();

    let err = init_logging(&config).unwrap_err();
    assert!(err.to_string().starts_with("Logging initialization failed: "));

    let context = Arc::new(SpyContext::with_tracing(SpyConfig::default()));
    let mut driver = SpyDriver::new(context);
    driver.register(Arc::new(MemoryDriver::new()));

    let mut conn = driver
        .connect("spy:mem:test", &Properties::new())
        .unwrap()
        .unwrap();
    let mut stmt = conn.create_statement().unwrap();
    assert_eq!(stmt.execute_update("delete from t").unwrap(), 1);
    stmt.close().unwrap();
    conn.close().unwrap();
    assert_eq!(driver.context().registry().open_connection_count(), 0);
}

//! Global subscriber installation. Kept in its own test binary so no other
//! test races for the global default.

use agent_telemetry::{init_logging, TelemetryConfig, TelemetryError};

#[test]
fn test_second_init_reports_already_initialized() {
    let config = TelemetryConfig {
        log_level: "debug".to_string(),
        json_logs: true,
        ..Default::default()
    };

    init_logging(&config).expect("first init succeeds");

    assert!(matches!(
        init_logging(&config),
        Err(TelemetryError::AlreadyInitialized)
    ));
}

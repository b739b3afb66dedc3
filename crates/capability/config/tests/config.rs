use qdb_config::{ApiConfig, BridgeConfig, ConfigError};
use std::sync::Mutex;
use std::time::Duration;

// 环境变量为进程级共享状态，测试间串行执行。
static ENV_LOCK: Mutex<()> = Mutex::new(());

const KEYS: &[&str] = &[
    "MQTT_HOST",
    "MQTT_PORT",
    "MQTT_TOPIC_FILTER",
    "MQTT_RECONNECT_DELAY_SECONDS",
    "MQTT_MAX_PACKET_BYTES",
    "QDB_WRITE_TIMEOUT_SECONDS",
    "QDB_HOST",
    "QDB_PORT",
    "QDB_TABLE",
    "SCHEMA_INIT_MAX_ATTEMPTS",
    "SCHEMA_INIT_DELAY_SECONDS",
    "METRIC_ERROR_POLICY",
    "HTTP_ADDR",
    "READINGS_TABLE",
];

fn clear_env() {
    // Rust 2024 中 set_var/remove_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn bridge_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_env();

    let config = BridgeConfig::from_env().expect("config");
    assert_eq!(config.mqtt_host, "localhost");
    assert_eq!(config.mqtt_port, 1883);
    assert_eq!(config.mqtt_topic_filter, "spBv1.0/#");
    assert_eq!(config.mqtt_reconnect_delay, Duration::from_secs(5));
    assert_eq!(config.mqtt_max_packet_bytes, 1024 * 1024);
    assert_eq!(config.write_timeout, Duration::from_secs(30));
    assert_eq!(config.store.host, "questdb");
    assert_eq!(config.store.port, 8812);
    assert_eq!(config.store.user, "admin");
    assert_eq!(config.store.database, "qdb");
    assert_eq!(config.metrics_table, "mqtt_metrics");
    assert_eq!(config.schema_init_max_attempts, 10);
    assert_eq!(config.schema_init_delay, Duration::from_secs(5));
    assert!(!config.skip_invalid_metrics);
}

#[test]
fn bridge_config_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("MQTT_HOST", "broker");
        std::env::set_var("MQTT_PORT", "8883");
        std::env::set_var("QDB_TABLE", "plant_metrics");
        std::env::set_var("SCHEMA_INIT_MAX_ATTEMPTS", "3");
        std::env::set_var("METRIC_ERROR_POLICY", "Skip");
        std::env::set_var("MQTT_MAX_PACKET_BYTES", "65536");
        std::env::set_var("QDB_WRITE_TIMEOUT_SECONDS", "3");
    }

    let config = BridgeConfig::from_env().expect("config");
    assert_eq!(config.mqtt_host, "broker");
    assert_eq!(config.mqtt_port, 8883);
    assert_eq!(config.metrics_table, "plant_metrics");
    assert_eq!(config.schema_init_max_attempts, 3);
    assert!(config.skip_invalid_metrics);
    assert_eq!(config.mqtt_max_packet_bytes, 65536);
    assert_eq!(config.write_timeout, Duration::from_secs(3));
    clear_env();
}

#[test]
fn bridge_config_rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("QDB_PORT", "not-a-port");
    }
    let err = BridgeConfig::from_env().expect_err("invalid port");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "QDB_PORT"));

    clear_env();
    unsafe {
        std::env::set_var("METRIC_ERROR_POLICY", "drop-everything");
    }
    let err = BridgeConfig::from_env().expect_err("invalid policy");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "METRIC_ERROR_POLICY"));

    clear_env();
    unsafe {
        std::env::set_var("SCHEMA_INIT_MAX_ATTEMPTS", "0");
    }
    assert!(BridgeConfig::from_env().is_err());

    clear_env();
    unsafe {
        std::env::set_var("MQTT_MAX_PACKET_BYTES", "268435456");
    }
    let err = BridgeConfig::from_env().expect_err("packet limit above protocol maximum");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "MQTT_MAX_PACKET_BYTES"));

    clear_env();
    unsafe {
        std::env::set_var("QDB_WRITE_TIMEOUT_SECONDS", "0");
    }
    let err = BridgeConfig::from_env().expect_err("zero write timeout");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "QDB_WRITE_TIMEOUT_SECONDS"));
    clear_env();
}

#[test]
fn api_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    clear_env();
    unsafe {
        std::env::set_var("HTTP_ADDR", "127.0.0.1:8081");
    }

    let config = ApiConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
    assert_eq!(config.pool_max_connections, 8);
    assert_eq!(config.readings_table, "Temp_data");
    assert_eq!(config.readings_value_column, "Temperatur");
    assert_eq!(config.readings_time_column, "Time");
    clear_env();
}

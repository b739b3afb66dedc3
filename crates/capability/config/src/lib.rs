//! 应用运行配置加载。
//!
//! 采集进程读取 [`BridgeConfig`]，查询服务读取 [`ApiConfig`]，二者共用 [`StoreConfig`]。
//! 所有变量均有本地开发默认值。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

const DEFAULT_MQTT_MAX_PACKET_BYTES: u64 = 1024 * 1024;
/// MQTT 3.1.1 剩余长度字段可表示的最大值。
const MQTT_MAX_REMAINING_LENGTH: u64 = 268_435_455;

/// QuestDB（PG wire）连接配置。
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: read_string_with_default("QDB_HOST", "questdb"),
            port: read_u16_with_default("QDB_PORT", 8812)?,
            user: read_string_with_default("QDB_USER", "admin"),
            password: read_string_with_default("QDB_PASSWORD", "quest"),
            database: read_string_with_default("QDB_DB", "qdb"),
            connect_timeout: Duration::from_secs(read_nonzero_u64_with_default(
                "QDB_CONNECT_TIMEOUT_SECONDS",
                10,
            )?),
        })
    }
}

/// 采集进程配置。
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_client_id: Option<String>,
    pub mqtt_topic_filter: String,
    pub mqtt_keep_alive: Duration,
    pub mqtt_reconnect_delay: Duration,
    /// 收发报文上限（字节），超过上限的报文会断开会话。
    pub mqtt_max_packet_bytes: usize,
    pub store: StoreConfig,
    /// 单批写入（建连 + insert + commit）的总时限。
    pub write_timeout: Duration,
    pub metrics_table: String,
    pub schema_init_max_attempts: u32,
    pub schema_init_delay: Duration,
    pub ingest_channel_capacity: usize,
    /// `METRIC_ERROR_POLICY=skip` 时为 true：丢弃非法指标、保留同条消息内的合法指标。
    pub skip_invalid_metrics: bool,
}

impl BridgeConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let mqtt_host = read_string_with_default("MQTT_HOST", "localhost");
        let mqtt_port = read_u16_with_default("MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("MQTT_USERNAME");
        let mqtt_password = read_optional("MQTT_PASSWORD");
        let mqtt_client_id = read_optional("MQTT_CLIENT_ID");
        let mqtt_topic_filter = read_string_with_default("MQTT_TOPIC_FILTER", "spBv1.0/#");
        let mqtt_keep_alive =
            Duration::from_secs(read_nonzero_u64_with_default("MQTT_KEEP_ALIVE_SECONDS", 30)?);
        let mqtt_reconnect_delay =
            Duration::from_secs(read_u64_with_default("MQTT_RECONNECT_DELAY_SECONDS", 5)?);
        let mqtt_max_packet_bytes = read_nonzero_u64_with_default(
            "MQTT_MAX_PACKET_BYTES",
            DEFAULT_MQTT_MAX_PACKET_BYTES,
        )?;
        if mqtt_max_packet_bytes > MQTT_MAX_REMAINING_LENGTH {
            return Err(ConfigError::Invalid(
                "MQTT_MAX_PACKET_BYTES".to_string(),
                mqtt_max_packet_bytes.to_string(),
            ));
        }
        let store = StoreConfig::from_env()?;
        let write_timeout =
            Duration::from_secs(read_nonzero_u64_with_default("QDB_WRITE_TIMEOUT_SECONDS", 30)?);
        let metrics_table = read_string_with_default("QDB_TABLE", "mqtt_metrics");
        let schema_init_max_attempts = read_u32_with_default("SCHEMA_INIT_MAX_ATTEMPTS", 10)?;
        if schema_init_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "SCHEMA_INIT_MAX_ATTEMPTS".to_string(),
                "0".to_string(),
            ));
        }
        let schema_init_delay =
            Duration::from_secs(read_u64_with_default("SCHEMA_INIT_DELAY_SECONDS", 5)?);
        let ingest_channel_capacity =
            read_nonzero_u64_with_default("INGEST_CHANNEL_CAPACITY", 100)? as usize;
        let skip_invalid_metrics = read_metric_error_policy("METRIC_ERROR_POLICY")?;

        Ok(Self {
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_client_id,
            mqtt_topic_filter,
            mqtt_keep_alive,
            mqtt_reconnect_delay,
            mqtt_max_packet_bytes: mqtt_max_packet_bytes as usize,
            store,
            write_timeout,
            metrics_table,
            schema_init_max_attempts,
            schema_init_delay,
            ingest_channel_capacity,
            skip_invalid_metrics,
        })
    }
}

/// 查询服务配置。
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub http_addr: String,
    pub store: StoreConfig,
    pub pool_max_connections: u32,
    pub readings_table: String,
    pub readings_value_column: String,
    pub readings_time_column: String,
}

impl ApiConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = read_string_with_default("HTTP_ADDR", "0.0.0.0:8000");
        let store = StoreConfig::from_env()?;
        let pool_max_connections = read_u32_with_default("QDB_POOL_MAX_CONNECTIONS", 8)?;
        if pool_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "QDB_POOL_MAX_CONNECTIONS".to_string(),
                "0".to_string(),
            ));
        }
        Ok(Self {
            http_addr,
            store,
            pool_max_connections,
            readings_table: read_string_with_default("READINGS_TABLE", "Temp_data"),
            readings_value_column: read_string_with_default("READINGS_VALUE_COLUMN", "Temperatur"),
            readings_time_column: read_string_with_default("READINGS_TIME_COLUMN", "Time"),
        })
    }
}

fn read_string_with_default(key: &str, default: &str) -> String {
    read_optional(key).unwrap_or_else(|| default.to_string())
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_nonzero_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = read_u64_with_default(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid(key.to_string(), "0".to_string()));
    }
    Ok(value)
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_metric_error_policy(key: &str) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "" | "reject" => Ok(false),
            "skip" => Ok(true),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
        Err(_) => Ok(false),
    }
}

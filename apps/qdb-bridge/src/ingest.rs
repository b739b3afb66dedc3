//! 采集链路装配
//!
//! 总线客户端循环（传输任务）→ 有界 mpsc 通道 → 单个消费任务（解析 + 批量写入）。
//! 同一时刻只处理一条消息，消息按到达顺序写入。

use domain::now_epoch_ms;
use qdb_config::BridgeConfig;
use qdb_ingest::{BusClientLoop, BusConnector, BusLoopConfig, MqttConnector, MqttConnectorConfig};
use qdb_normalize::MetricErrorPolicy;
use qdb_pipeline::MetricPipeline;
use qdb_storage::MetricStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 采集链路的两个后台任务。
pub struct IngestTasks {
    pub bus: JoinHandle<()>,
    pub consumer: JoinHandle<u64>,
}

impl IngestTasks {
    /// 等待两个任务结束：总线循环先退出并释放发送端，消费端随后排空。
    pub async fn join(self) {
        if let Err(err) = self.bus.await {
            warn!(target: "qdb.bridge", error = %err, "bus_task_failed");
        }
        match self.consumer.await {
            Ok(processed) => info!(target: "qdb.bridge", processed, "consumer_finished"),
            Err(err) => warn!(target: "qdb.bridge", error = %err, "consumer_task_failed"),
        }
    }
}

/// 由配置构造 MQTT 连接器；未配置 client id 时按启动时间生成。
pub fn mqtt_connector(config: &BridgeConfig) -> MqttConnector {
    let client_id = config
        .mqtt_client_id
        .clone()
        .unwrap_or_else(|| format!("qdb-bridge-{}", now_epoch_ms()));
    MqttConnector::new(MqttConnectorConfig {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        client_id,
        keep_alive: config.mqtt_keep_alive,
        connect_timeout: config.store.connect_timeout,
        max_packet_size: config.mqtt_max_packet_bytes,
    })
}

pub fn metric_error_policy(config: &BridgeConfig) -> MetricErrorPolicy {
    if config.skip_invalid_metrics {
        MetricErrorPolicy::Skip
    } else {
        MetricErrorPolicy::Reject
    }
}

/// 启动采集任务（MQTT 传输）。
pub fn spawn_ingest(
    config: &BridgeConfig,
    store: Arc<dyn MetricStore>,
    cancel: CancellationToken,
) -> IngestTasks {
    let connector: Arc<dyn BusConnector> = Arc::new(mqtt_connector(config));
    info!(
        target: "qdb.bridge",
        host = %config.mqtt_host,
        port = config.mqtt_port,
        filter = %config.mqtt_topic_filter,
        policy = ?metric_error_policy(config),
        "ingest_source_mqtt"
    );
    spawn_with_connector(config, connector, store, cancel)
}

/// 以任意连接器启动采集任务。
pub fn spawn_with_connector(
    config: &BridgeConfig,
    connector: Arc<dyn BusConnector>,
    store: Arc<dyn MetricStore>,
    cancel: CancellationToken,
) -> IngestTasks {
    let (tx, rx) = mpsc::channel(config.ingest_channel_capacity);
    let pipeline = MetricPipeline::new(store, metric_error_policy(config))
        .with_write_timeout(config.write_timeout);
    let consumer = tokio::spawn(async move { pipeline.run(rx).await });

    let bus = BusClientLoop::new(
        connector,
        BusLoopConfig {
            topic_filter: config.mqtt_topic_filter.clone(),
            reconnect_delay: config.mqtt_reconnect_delay,
        },
    );
    let bus = tokio::spawn(bus.run(tx, cancel));
    IngestTasks { bus, consumer }
}

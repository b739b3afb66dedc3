//! MQTT → QuestDB 采集进程。
//!
//! 启动顺序：加载配置 → 初始化日志 → 建表（有界重试，失败即退出）→ 启动采集链路。
//! SIGINT/SIGTERM 取消全局 token，总线循环退出后消费端排空通道再结束。

mod ingest;

use qdb_config::BridgeConfig;
use qdb_storage::{
    PgMetricStore, SchemaInitPolicy, StorageErrorKind, connect_options, ensure_schema,
};
use qdb_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在）
    dotenvy::dotenv().ok();
    let config = BridgeConfig::from_env()?;
    init_tracing();
    info!(
        target: "qdb.bridge",
        mqtt_host = %config.mqtt_host,
        mqtt_port = config.mqtt_port,
        topic_filter = %config.mqtt_topic_filter,
        store_host = %config.store.host,
        store_port = config.store.port,
        table = %config.metrics_table,
        "bridge_starting"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let store = Arc::new(PgMetricStore::new(
        connect_options(&config.store),
        config.metrics_table.clone(),
        config.store.connect_timeout,
    )?);

    // 表结构未确认前不订阅总线
    let policy = SchemaInitPolicy {
        max_attempts: config.schema_init_max_attempts,
        delay: config.schema_init_delay,
    };
    if let Err(err) = ensure_schema(store.as_ref(), policy, &cancel).await {
        if err.kind() == StorageErrorKind::Cancelled {
            info!(target: "qdb.bridge", "bridge_stopped_before_ready");
            return Ok(());
        }
        error!(target: "qdb.bridge", error = %err, "schema_init_failed");
        return Err(err.into());
    }

    let tasks = ingest::spawn_ingest(&config, store, cancel.clone());
    tasks.join().await;

    let snapshot = metrics().snapshot();
    info!(
        target: "qdb.bridge",
        messages_received = snapshot.messages_received,
        messages_rejected = snapshot.messages_rejected,
        metrics_skipped = snapshot.metrics_skipped,
        batches_written = snapshot.batches_written,
        rows_written = snapshot.rows_written,
        write_failures = snapshot.write_failures,
        bus_connects = snapshot.bus_connects,
        bus_disconnects = snapshot.bus_disconnects,
        schema_init_attempts = snapshot.schema_init_attempts,
        "bridge_stopped"
    );
    Ok(())
}

/// 等待 SIGINT/SIGTERM 后取消 token。
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target: "qdb.bridge", error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target: "qdb.bridge", error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(target: "qdb.bridge", signal = "SIGINT", "shutdown_requested"),
        () = terminate => info!(target: "qdb.bridge", signal = "SIGTERM", "shutdown_requested"),
    }
    cancel.cancel();
}

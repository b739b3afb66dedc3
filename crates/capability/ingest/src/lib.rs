//! 总线客户端循环。
//!
//! 状态机：`Disconnected → Connecting → Subscribed →（传输错误）Disconnected`。
//! 初始为 `Disconnected`，除外部取消外没有终止状态。收到的消息按投递顺序
//! 写入通道，由单个消费任务处理；断线期间发布的消息不会补发。

pub mod mqtt;

use async_trait::async_trait;
use domain::InboundMessage;
use qdb_telemetry::{record_bus_connect, record_bus_disconnect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use mqtt::{MqttConnector, MqttConnectorConfig};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("connect error: {0}")]
    Connect(String),
    #[error("subscribe error: {0}")]
    Subscribe(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// 总线连接状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Subscribed,
}

/// 总线连接器：每次调用建立一个全新会话。
#[async_trait]
pub trait BusConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BusSession>, IngestError>;
}

/// 已连接的总线会话。
#[async_trait]
pub trait BusSession: Send {
    async fn subscribe(&mut self, filter: &str) -> Result<(), IngestError>;

    /// 阻塞等待下一条消息；返回错误表示会话已断开。
    async fn next_message(&mut self) -> Result<InboundMessage, IngestError>;

    /// 主动断开（退出时调用）。
    async fn close(&mut self) {}
}

/// 循环参数。
#[derive(Debug, Clone)]
pub struct BusLoopConfig {
    pub topic_filter: String,
    pub reconnect_delay: Duration,
}

impl Default for BusLoopConfig {
    fn default() -> Self {
        Self {
            topic_filter: "spBv1.0/#".to_string(),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

enum SessionEnd {
    Cancelled,
    ConsumerClosed,
    Transport(IngestError),
}

/// 总线客户端循环。
pub struct BusClientLoop {
    connector: Arc<dyn BusConnector>,
    config: BusLoopConfig,
    state: watch::Sender<LinkState>,
}

impl BusClientLoop {
    pub fn new(connector: Arc<dyn BusConnector>, config: BusLoopConfig) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            connector,
            config,
            state,
        }
    }

    /// 订阅状态变化。
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// 运行直到取消或消费端关闭；返回时发送端随之释放，消费端可据此排空退出。
    pub async fn run(self, tx: mpsc::Sender<InboundMessage>, cancel: CancellationToken) {
        let filter = self.config.topic_filter.clone();
        loop {
            self.set_state(LinkState::Connecting);
            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.connect_and_subscribe(&filter) => result,
            };
            match connected {
                Ok(mut session) => {
                    record_bus_connect();
                    self.set_state(LinkState::Subscribed);
                    info!(target: "qdb.ingest", filter = %filter, "bus_subscribed");
                    match pump(session.as_mut(), &tx, &cancel).await {
                        SessionEnd::Cancelled => {
                            session.close().await;
                            break;
                        }
                        SessionEnd::ConsumerClosed => {
                            session.close().await;
                            warn!(target: "qdb.ingest", "consumer_closed");
                            break;
                        }
                        SessionEnd::Transport(err) => {
                            record_bus_disconnect();
                            warn!(target: "qdb.ingest", error = %err, "bus_disconnected");
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        target: "qdb.ingest",
                        error = %err,
                        retry_in_ms = self.config.reconnect_delay.as_millis() as u64,
                        "bus_connect_failed"
                    );
                }
            }
            self.set_state(LinkState::Disconnected);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
        self.set_state(LinkState::Disconnected);
        info!(target: "qdb.ingest", "bus_loop_stopped");
    }

    async fn connect_and_subscribe(
        &self,
        filter: &str,
    ) -> Result<Box<dyn BusSession>, IngestError> {
        let mut session = self.connector.connect().await?;
        session.subscribe(filter).await?;
        Ok(session)
    }

    fn set_state(&self, state: LinkState) {
        self.state.send_replace(state);
    }
}

async fn pump(
    session: &mut dyn BusSession,
    tx: &mpsc::Sender<InboundMessage>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            next = session.next_message() => next,
        };
        let message = match next {
            Ok(message) => message,
            Err(err) => return SessionEnd::Transport(err),
        };
        let sent = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            sent = tx.send(message) => sent,
        };
        if sent.is_err() {
            return SessionEnd::ConsumerClosed;
        }
    }
}

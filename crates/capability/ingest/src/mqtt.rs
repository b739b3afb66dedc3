//! MQTT 传输（rumqttc）。

use crate::{BusConnector, BusSession, IngestError};
use async_trait::async_trait;
use domain::{InboundMessage, now_epoch_ms};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode,
};
use std::time::Duration;

/// MQTT 连接配置。
#[derive(Debug, Clone)]
pub struct MqttConnectorConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    /// 收发报文上限（字节）。rumqttc 默认仅 10 KiB，指标较多的消息会超出。
    pub max_packet_size: usize,
}

/// MQTT 连接器：每次连接新建 client + eventloop。
#[derive(Debug, Clone)]
pub struct MqttConnector {
    config: MqttConnectorConfig,
}

impl MqttConnector {
    pub fn new(config: MqttConnectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttConnectorConfig {
        &self.config
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(self.config.keep_alive);
        options.set_max_packet_size(self.config.max_packet_size, self.config.max_packet_size);
        options.set_clean_session(true);
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }
        options
    }
}

#[async_trait]
impl BusConnector for MqttConnector {
    async fn connect(&self) -> Result<Box<dyn BusSession>, IngestError> {
        let (client, mut eventloop) = AsyncClient::new(self.options(), 10);
        tokio::time::timeout(self.config.connect_timeout, wait_connack(&mut eventloop))
            .await
            .map_err(|_| IngestError::Connect("connect timed out".to_string()))??;
        Ok(Box::new(MqttSession { client, eventloop }))
    }
}

/// 首次 poll 建立 TCP 连接并等待 CONNACK。
async fn wait_connack(eventloop: &mut EventLoop) -> Result<(), IngestError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                return Err(IngestError::Connect(format!("connack: {:?}", ack.code)));
            }
            Ok(_) => {}
            Err(err) => return Err(IngestError::Connect(err.to_string())),
        }
    }
}

struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
}

#[async_trait]
impl BusSession for MqttSession {
    async fn subscribe(&mut self, filter: &str) -> Result<(), IngestError> {
        self.client
            .subscribe(filter.to_string(), QoS::AtMostOnce)
            .await
            .map_err(|err| IngestError::Subscribe(err.to_string()))
    }

    async fn next_message(&mut self) -> Result<InboundMessage, IngestError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Ok(InboundMessage::new(
                        publish.topic,
                        publish.payload.to_vec(),
                        now_epoch_ms(),
                    ));
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    if ack
                        .return_codes
                        .iter()
                        .any(|code| matches!(code, SubscribeReasonCode::Failure))
                    {
                        return Err(IngestError::Subscribe("broker rejected subscription".to_string()));
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    return Err(IngestError::Transport("broker sent disconnect".to_string()));
                }
                Ok(_) => {}
                Err(err) => return Err(IngestError::Transport(err.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        if self.client.try_disconnect().is_ok() {
            // 让 eventloop 把 DISCONNECT 发出去。
            let _ = tokio::time::timeout(Duration::from_secs(1), self.eventloop.poll()).await;
        }
    }
}

//! 消息处理流水线：topic 解码 → payload 解析 → 批量写入。
//!
//! 单个消费任务按接收顺序逐条处理，不做并行扇出；
//! 单条消息的任何错误只记录日志并丢弃该消息，不影响后续消息。

use domain::{InboundMessage, MetricRecord, StoredRow, TopicDimensions};
use qdb_normalize::{MetricErrorPolicy, NormalizeError, decode_topic, parse_payload};
use qdb_storage::{MetricStore, StorageError};
use qdb_telemetry::{
    record_batch_written, record_message_received, record_message_rejected,
    record_metrics_skipped, record_write_failure,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pipeline 处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("parse error: {0}")]
    Parse(#[from] NormalizeError),
    #[error("writer error: {0}")]
    Writer(#[from] StorageError),
}

/// 单条消息的处理结果。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOutcome {
    pub rows_written: usize,
    pub metrics_skipped: usize,
}

/// 单批写入默认时限。
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// 批量写入一条消息的全部指标。
///
/// 空列表直接返回，不建立任何连接；否则整批交给存储在单个事务内写入。
/// 整个写入（建连、insert、commit）受 `timeout` 约束，超时后放弃该批，
/// 未完成的事务随连接释放回滚。不做内部重试，错误原样返回给调用方。
pub async fn write_batch(
    store: &dyn MetricStore,
    dims: &TopicDimensions,
    records: Vec<MetricRecord>,
    timeout: Duration,
) -> Result<usize, StorageError> {
    if records.is_empty() {
        return Ok(0);
    }
    let rows: Vec<StoredRow> = records
        .into_iter()
        .map(|record| StoredRow::new(dims, record))
        .collect();
    match tokio::time::timeout(timeout, store.insert_rows(&rows)).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::timeout(format!(
            "batch write of {} rows timed out after {}ms",
            rows.len(),
            timeout.as_millis()
        ))),
    }
}

/// Pipeline 入口。
#[derive(Clone)]
pub struct MetricPipeline {
    store: Arc<dyn MetricStore>,
    policy: MetricErrorPolicy,
    write_timeout: Duration,
}

impl MetricPipeline {
    pub fn new(store: Arc<dyn MetricStore>, policy: MetricErrorPolicy) -> Self {
        Self {
            store,
            policy,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// 设置单批写入时限。
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub fn policy(&self) -> MetricErrorPolicy {
        self.policy
    }

    /// 处理单条消息。
    pub async fn handle(&self, message: &InboundMessage) -> Result<HandleOutcome, PipelineError> {
        let dims = decode_topic(&message.topic);
        let parsed = parse_payload(&message.payload, self.policy)?;
        for skipped in &parsed.skipped {
            warn!(
                target: "qdb.ingest",
                topic = %message.topic,
                error = %skipped,
                "metric_skipped"
            );
        }
        let rows_written =
            write_batch(self.store.as_ref(), &dims, parsed.records, self.write_timeout).await?;
        Ok(HandleOutcome {
            rows_written,
            metrics_skipped: parsed.skipped.len(),
        })
    }

    /// 消费循环：直到发送端全部关闭且通道排空后返回，返回已处理消息数。
    pub async fn run(&self, mut rx: mpsc::Receiver<InboundMessage>) -> u64 {
        let mut processed = 0u64;
        while let Some(message) = rx.recv().await {
            processed += 1;
            record_message_received();
            match self.handle(&message).await {
                Ok(outcome) => {
                    if outcome.metrics_skipped > 0 {
                        record_metrics_skipped(outcome.metrics_skipped as u64);
                    }
                    if outcome.rows_written == 0 {
                        debug!(target: "qdb.ingest", topic = %message.topic, "message_empty");
                        continue;
                    }
                    record_batch_written(outcome.rows_written as u64);
                    info!(
                        target: "qdb.ingest",
                        topic = %message.topic,
                        rows = outcome.rows_written,
                        skipped = outcome.metrics_skipped,
                        "batch_written"
                    );
                }
                Err(PipelineError::Parse(err)) => {
                    record_message_rejected();
                    warn!(
                        target: "qdb.ingest",
                        topic = %message.topic,
                        payload_size = message.payload.len(),
                        error = %err,
                        "message_rejected"
                    );
                }
                Err(PipelineError::Writer(err)) => {
                    record_write_failure();
                    warn!(
                        target: "qdb.ingest",
                        topic = %message.topic,
                        error = %err,
                        "batch_write_failed"
                    );
                }
            }
        }
        info!(target: "qdb.ingest", processed, "pipeline_stopped");
        processed
    }
}

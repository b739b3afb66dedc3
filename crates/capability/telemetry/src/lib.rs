//! 追踪、请求 ID 与采集指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_rejected: u64,
    pub metrics_skipped: u64,
    pub batches_written: u64,
    pub rows_written: u64,
    pub write_failures: u64,
    pub bus_connects: u64,
    pub bus_disconnects: u64,
    pub schema_init_attempts: u64,
}

/// 采集指标（进程级计数器）。
pub struct IngestMetrics {
    messages_received: AtomicU64,
    messages_rejected: AtomicU64,
    metrics_skipped: AtomicU64,
    batches_written: AtomicU64,
    rows_written: AtomicU64,
    write_failures: AtomicU64,
    bus_connects: AtomicU64,
    bus_disconnects: AtomicU64,
    schema_init_attempts: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_rejected: AtomicU64::new(0),
            metrics_skipped: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            bus_connects: AtomicU64::new(0),
            bus_disconnects: AtomicU64::new(0),
            schema_init_attempts: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
            metrics_skipped: self.metrics_skipped.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            bus_connects: self.bus_connects.load(Ordering::Relaxed),
            bus_disconnects: self.bus_disconnects.load(Ordering::Relaxed),
            schema_init_attempts: self.schema_init_attempts.load(Ordering::Relaxed),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<IngestMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static IngestMetrics {
    METRICS.get_or_init(IngestMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录总线消息接收次数。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录整条消息被拒绝（解析失败）次数。
pub fn record_message_rejected() {
    metrics().messages_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录被跳过的非法指标条数。
pub fn record_metrics_skipped(count: u64) {
    metrics().metrics_skipped.fetch_add(count, Ordering::Relaxed);
}

/// 记录一次成功提交的批量写入及其行数。
pub fn record_batch_written(rows: u64) {
    let metrics = metrics();
    metrics.batches_written.fetch_add(1, Ordering::Relaxed);
    metrics.rows_written.fetch_add(rows, Ordering::Relaxed);
}

/// 记录写入失败次数。
pub fn record_write_failure() {
    metrics().write_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录总线连接成功次数。
pub fn record_bus_connect() {
    metrics().bus_connects.fetch_add(1, Ordering::Relaxed);
}

/// 记录总线断线次数。
pub fn record_bus_disconnect() {
    metrics().bus_disconnects.fetch_add(1, Ordering::Relaxed);
}

/// 记录建表尝试次数。
pub fn record_schema_init_attempt() {
    metrics()
        .schema_init_attempts
        .fetch_add(1, Ordering::Relaxed);
}

//! 总线消息规范化：topic 解码与 payload 解析。

pub mod payload;
pub mod topic;

pub use payload::{
    FieldError, MAX_TS_MS, MetricError, MetricErrorPolicy, ParsedPayload, parse_metric,
    parse_payload,
};
pub use topic::decode_topic;

/// 规范化错误。
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("invalid metric: {0}")]
    InvalidMetric(MetricError),
}

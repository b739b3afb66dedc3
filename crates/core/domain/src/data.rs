/// 总线输入原始消息。
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at_ms: i64,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, received_at_ms: i64) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at_ms,
        }
    }
}

/// 从 topic 按位置解出的五个维度标签。
///
/// topic 段数不足 5 时，缺失段及其后的标签均为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicDimensions {
    pub namespace: Option<String>,
    pub group: Option<String>,
    pub message_type: Option<String>,
    pub node: Option<String>,
    pub device: Option<String>,
}

/// 单条指标测量值（时间戳已换算为毫秒）。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: Option<String>,
    pub alias: Option<i32>,
    pub value: Option<f64>,
    pub ts_ms: i64,
}

/// 落库行：维度标签 + 指标字段，一条指标一行。
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub namespace: Option<String>,
    pub group_name: Option<String>,
    pub message_type: Option<String>,
    pub node: Option<String>,
    pub device: Option<String>,
    pub metric_name: Option<String>,
    pub metric_alias: Option<i32>,
    pub value: Option<f64>,
    pub ts_ms: i64,
}

impl StoredRow {
    /// 拼接维度与指标，得到一行待写入数据。
    pub fn new(dims: &TopicDimensions, record: MetricRecord) -> Self {
        Self {
            namespace: dims.namespace.clone(),
            group_name: dims.group.clone(),
            message_type: dims.message_type.clone(),
            node: dims.node.clone(),
            device: dims.device.clone(),
            metric_name: record.name,
            metric_alias: record.alias,
            value: record.value,
            ts_ms: record.ts_ms,
        }
    }
}

//! 消息体 → 指标列表。
//!
//! 消息体须为 JSON 对象，`metrics` 字段为指标数组；缺省时视为空列表。
//! 每个字段单独校验并产出带标签的结果，任何一个字段失败即该条指标失败，
//! 失败后的处理由 [`MetricErrorPolicy`] 决定。

use domain::MetricRecord;
use serde_json::{Map, Value};

use crate::NormalizeError;

/// 单条指标校验失败时的处理策略。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricErrorPolicy {
    /// 任一指标非法则整条消息拒绝，不写入任何行。
    #[default]
    Reject,
    /// 丢弃非法指标，保留同条消息内的合法指标。
    Skip,
}

/// 字段级校验错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("missing")]
    Missing,
    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("not numeric: {0:?}")]
    NotNumeric(String),
    #[error("out of range")]
    OutOfRange,
}

/// 指标级校验错误（定位到数组下标与字段）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("metrics[{index}].{field}: {reason}")]
pub struct MetricError {
    pub index: usize,
    pub field: &'static str,
    pub reason: FieldError,
}

/// 解析结果。
#[derive(Debug, Clone, Default)]
pub struct ParsedPayload {
    pub records: Vec<MetricRecord>,
    /// `Skip` 策略下被丢弃的指标；`Reject` 策略下恒为空。
    pub skipped: Vec<MetricError>,
}

/// 解析消息体。
pub fn parse_payload(
    body: &[u8],
    policy: MetricErrorPolicy,
) -> Result<ParsedPayload, NormalizeError> {
    let document: Value = serde_json::from_slice(body)
        .map_err(|err| NormalizeError::InvalidPayload(err.to_string()))?;
    let Value::Object(document) = document else {
        return Err(NormalizeError::InvalidPayload(format!(
            "expected object, got {}",
            json_type(&document)
        )));
    };
    let items = match document.get("metrics") {
        None => return Ok(ParsedPayload::default()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(NormalizeError::InvalidPayload(format!(
                "metrics: expected array, got {}",
                json_type(other)
            )));
        }
    };

    let mut parsed = ParsedPayload {
        records: Vec::with_capacity(items.len()),
        skipped: Vec::new(),
    };
    for (index, item) in items.iter().enumerate() {
        match parse_metric(index, item) {
            Ok(record) => parsed.records.push(record),
            Err(err) => match policy {
                MetricErrorPolicy::Reject => return Err(NormalizeError::InvalidMetric(err)),
                MetricErrorPolicy::Skip => parsed.skipped.push(err),
            },
        }
    }
    Ok(parsed)
}

/// 校验并转换单条指标。
pub fn parse_metric(index: usize, item: &Value) -> Result<MetricRecord, MetricError> {
    let at = |field: &'static str| move |reason: FieldError| MetricError {
        index,
        field,
        reason,
    };
    let Value::Object(fields) = item else {
        return Err(at("metric")(FieldError::WrongType {
            expected: "object",
            found: json_type(item),
        }));
    };

    Ok(MetricRecord {
        name: parse_name(fields).map_err(at("name"))?,
        alias: parse_alias(fields).map_err(at("alias"))?,
        value: parse_value(fields).map_err(at("value"))?,
        ts_ms: parse_timestamp_ms(fields).map_err(at("timestamp"))?,
    })
}

fn parse_name(fields: &Map<String, Value>) -> Result<Option<String>, FieldError> {
    match fields.get("name") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) => Ok(Some(name.clone())),
        Some(other) => Err(FieldError::WrongType {
            expected: "string",
            found: json_type(other),
        }),
    }
}

fn parse_alias(fields: &Map<String, Value>) -> Result<Option<i32>, FieldError> {
    match fields.get("alias") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => {
            if let Some(alias) = number.as_i64() {
                return i32::try_from(alias).map(Some).map_err(|_| FieldError::OutOfRange);
            }
            if number.is_u64() {
                return Err(FieldError::OutOfRange);
            }
            Err(FieldError::WrongType {
                expected: "integer",
                found: "float",
            })
        }
        Some(other) => Err(FieldError::WrongType {
            expected: "integer",
            found: json_type(other),
        }),
    }
}

/// 缺省或 null 时不做数值转换；字符串按十进制浮点解析。
fn parse_value(fields: &Map<String, Value>) -> Result<Option<f64>, FieldError> {
    match fields.get("value") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| FieldError::NotNumeric(number.to_string())),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FieldError::NotNumeric(text.clone())),
        Some(Value::Bool(flag)) => Ok(Some(if *flag { 1.0 } else { 0.0 })),
        Some(other) => Err(FieldError::WrongType {
            expected: "number",
            found: json_type(other),
        }),
    }
}

/// 毫秒时间戳上限：存储端以微秒保存，毫秒值须能再乘 1000 不溢出。
pub const MAX_TS_MS: i64 = i64::MAX / 1000;

/// 秒 → 毫秒。整数秒精确相乘；小数秒四舍五入到毫秒。
fn parse_timestamp_ms(fields: &Map<String, Value>) -> Result<i64, FieldError> {
    let number = match fields.get("timestamp") {
        None | Some(Value::Null) => return Err(FieldError::Missing),
        Some(Value::Number(number)) => number,
        Some(other) => {
            return Err(FieldError::WrongType {
                expected: "number",
                found: json_type(other),
            });
        }
    };
    if let Some(secs) = number.as_i64() {
        let ms = secs.checked_mul(1000).ok_or(FieldError::OutOfRange)?;
        if !(-MAX_TS_MS..=MAX_TS_MS).contains(&ms) {
            return Err(FieldError::OutOfRange);
        }
        return Ok(ms);
    }
    if number.is_u64() {
        return Err(FieldError::OutOfRange);
    }
    let secs = number
        .as_f64()
        .ok_or_else(|| FieldError::NotNumeric(number.to_string()))?;
    let ms = (secs * 1000.0).round();
    if !ms.is_finite() || ms.abs() > MAX_TS_MS as f64 {
        return Err(FieldError::OutOfRange);
    }
    Ok(ms as i64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

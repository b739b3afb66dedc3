//! topic → 维度标签。

use domain::TopicDimensions;

/// 按 `/` 切分 topic，依位置取前 5 段作为维度标签。
///
/// 段内容原样保留（包括空段），不做校验；段数不足时尾部标签为 `None`。
pub fn decode_topic(topic: &str) -> TopicDimensions {
    let mut parts = topic.split('/').map(str::to_string);
    TopicDimensions {
        namespace: parts.next(),
        group: parts.next(),
        message_type: parts.next(),
        node: parts.next(),
        device: parts.next(),
    }
}

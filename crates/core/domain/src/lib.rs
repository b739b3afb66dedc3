//! 采集链路共享的领域模型。

pub mod clock;
pub mod data;

pub use clock::now_epoch_ms;
pub use data::{InboundMessage, MetricRecord, StoredRow, TopicDimensions};

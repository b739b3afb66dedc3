//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - MetricStore: InMemoryMetricStore
//! - ReadingStore: InMemoryReadingStore

pub mod metrics;
pub mod readings;

pub use metrics::*;
pub use readings::*;

//! 存储接口 Trait 定义
//!
//! - MetricStore：采集侧建表与批量写入
//! - ReadingStore：查询服务的连通性探测与最新读数查询
//!
//! 使用 async_trait 支持动态分发，便于注入内存实现与测试替身。

use crate::error::StorageError;
use crate::models::{LatestReading, ReadingsTable};
use async_trait::async_trait;
use domain::StoredRow;

/// 指标存储接口
///
/// 每次调用独占一条新连接，调用结束即释放。
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// 幂等建表（create if not exists）
    async fn create_table(&self) -> Result<(), StorageError>;

    /// 单事务内以一条多行 insert 写入全部行，返回写入行数
    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError>;
}

/// 读数查询接口
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// 连通性探测，返回存储端当前时间
    async fn ping(&self) -> Result<String, StorageError>;

    /// 按时间倒序取最新一行；表为空返回 `None`，表不存在返回 `UndefinedTable`
    async fn latest_reading(
        &self,
        target: &ReadingsTable,
    ) -> Result<Option<LatestReading>, StorageError>;
}

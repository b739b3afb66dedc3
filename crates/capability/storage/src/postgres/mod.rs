//! # QuestDB（PG wire 协议）存储实现
//!
//! - **PgMetricStore** (`metrics.rs`)：采集侧建表与批量写入。每次调用新建一条连接，
//!   写入在单个事务中以一条多行 insert 完成，提交后关闭连接。
//! - **PgReadingStore** (`readings.rs`)：查询服务使用的连接池读取。
//!
//! 表名、列名来自配置，构造时经 [`crate::validate_identifier`] 校验后才拼接进 SQL；
//! 数据值一律参数绑定。

pub mod metrics;
pub mod readings;

pub use metrics::*;
pub use readings::*;

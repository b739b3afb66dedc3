//! # QDB Storage 模块
//!
//! 采集链路与查询服务共用的存储抽象层。
//!
//! ## 模块说明
//!
//! - [`traits`]：存储接口（`MetricStore` 建表/批量写入，`ReadingStore` 探测/最新读数）
//! - [`models`]：查询目标与结果模型
//! - [`error`]：带类别的存储错误（连接 / 表不存在 / 查询）
//! - [`validation`]：SQL 标识符校验
//! - [`connection`]：连接池与一次性连接，均受超时约束
//! - [`schema`]：启动建表与有界重试
//! - [`postgres`]：QuestDB PG wire 实现
//! - [`in_memory`]：内存实现（测试与演示）
//!
//! ## 连接归属
//!
//! - 查询服务在启动时建立连接池，由服务状态持有并注入各 handler。
//! - 采集侧每次建表、每个批次各自独占一条新连接，用完即关闭；
//!   未提交的事务随连接释放回滚，任何退出路径都不会泄漏连接。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use qdb_storage::{PgMetricStore, SchemaInitPolicy, connect_options, ensure_schema};
//!
//! let store = PgMetricStore::new(connect_options(&config.store), "mqtt_metrics", timeout)?;
//! ensure_schema(&store, SchemaInitPolicy::default(), &cancel).await?;
//! store.insert_rows(&rows).await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use schema::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{InMemoryMetricStore, InMemoryReadingStore};
pub use postgres::{PgMetricStore, PgReadingStore, create_table_sql};

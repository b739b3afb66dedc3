//! 数据库连接管理
//!
//! 提供两类连接：
//! - connect_pool：查询服务使用的连接池（启动时建立，生命周期随服务）
//! - connect_single：采集侧每次建表/批量写入独占的一次性连接
//!
//! 所有连接建立均受超时约束，避免存储挂起时阻塞整条链路。

use crate::error::StorageError;
use qdb_config::StoreConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};
use std::time::Duration;

/// 由配置构造 PG wire 连接参数。
pub fn connect_options(config: &StoreConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
}

/// 建立连接池
///
/// # 参数
/// - `options`：连接参数
/// - `max_connections`：最大连接数
/// - `acquire_timeout`：建立/获取连接超时
pub async fn connect_pool(
    options: PgConnectOptions,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// 建立一条独占连接，超时视为连接错误。
pub async fn connect_single(
    options: &PgConnectOptions,
    timeout: Duration,
) -> Result<PgConnection, StorageError> {
    let conn = tokio::time::timeout(timeout, PgConnection::connect_with(options)).await??;
    Ok(conn)
}

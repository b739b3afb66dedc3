//! 指标表建表与批量写入（QuestDB PG wire）

use crate::connection::connect_single;
use crate::error::StorageError;
use crate::traits::MetricStore;
use crate::validation::validate_identifier;
use domain::StoredRow;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::debug;

/// 写入列顺序，与建表语句一致。
const INSERT_COLUMNS: &str =
    "namespace, group_name, type, node, device, metric_name, metric_alias, value, ts";

pub struct PgMetricStore {
    options: PgConnectOptions,
    table: String,
    connect_timeout: Duration,
}

impl PgMetricStore {
    pub fn new(
        options: PgConnectOptions,
        table: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            options,
            table,
            connect_timeout,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// 建表语句：标签列为 SYMBOL，`ts` 为指定时间列。
pub fn create_table_sql(table: &str) -> String {
    format!(
        "create table if not exists {table} ( \
         namespace symbol, \
         group_name symbol, \
         type symbol, \
         node symbol, \
         device symbol, \
         metric_name symbol, \
         metric_alias int, \
         value double, \
         ts timestamp \
         ) timestamp(ts)"
    )
}

/// 每行绑定参数个数。
const INSERT_COLUMN_COUNT: usize = 9;

/// 单条 insert 的最大行数；PG wire 单语句最多 65535 个绑定参数。
const INSERT_CHUNK_ROWS: usize = 1000;

const _: () = assert!(INSERT_CHUNK_ROWS * INSERT_COLUMN_COUNT <= u16::MAX as usize);

/// 领域模型的毫秒时间戳转 QuestDB 原生微秒时间戳。
fn ts_micros(ts_ms: i64) -> Result<i64, StorageError> {
    ts_ms
        .checked_mul(1000)
        .ok_or_else(|| StorageError::query(format!("timestamp out of range [ts_ms={ts_ms}]")))
}

/// 构造一条多行 insert，时间戳在此换算。
fn build_insert(
    table: &str,
    rows: &[StoredRow],
) -> Result<QueryBuilder<'static, Postgres>, StorageError> {
    let micros = rows
        .iter()
        .map(|row| ts_micros(row.ts_ms))
        .collect::<Result<Vec<_>, _>>()?;
    let mut builder = QueryBuilder::new(format!("insert into {table} ({INSERT_COLUMNS}) "));
    builder.push_values(rows.iter().zip(micros), |mut b, (row, ts)| {
        b.push_bind(row.namespace.clone())
            .push_bind(row.group_name.clone())
            .push_bind(row.message_type.clone())
            .push_bind(row.node.clone())
            .push_bind(row.device.clone())
            .push_bind(row.metric_name.clone())
            .push_bind(row.metric_alias)
            .push_bind(row.value)
            .push_bind(ts);
    });
    Ok(builder)
}

/// 按 [`INSERT_CHUNK_ROWS`] 分段构造全部语句，由调用方在同一事务内依次执行。
fn insert_statements(
    table: &str,
    rows: &[StoredRow],
) -> Result<Vec<QueryBuilder<'static, Postgres>>, StorageError> {
    rows.chunks(INSERT_CHUNK_ROWS)
        .map(|chunk| build_insert(table, chunk))
        .collect()
}

#[async_trait::async_trait]
impl MetricStore for PgMetricStore {
    async fn create_table(&self) -> Result<(), StorageError> {
        let mut conn = connect_single(&self.options, self.connect_timeout).await?;
        sqlx::query(&create_table_sql(&self.table))
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        // 语句先于连接构造，非法行不会占用连接。
        let mut statements = insert_statements(&self.table, rows)?;
        let mut conn = connect_single(&self.options, self.connect_timeout).await?;
        // 出错时 tx/conn 随作用域释放，未提交的事务由连接关闭回滚。
        let mut tx = conn.begin().await?;
        let mut affected = 0u64;
        for statement in statements.iter_mut() {
            affected += statement.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        conn.close().await?;
        debug!(
            target: "qdb.storage",
            table = %self.table,
            rows = rows.len(),
            statements = statements.len(),
            affected,
            "batch_committed"
        );
        Ok(rows.len())
    }
}

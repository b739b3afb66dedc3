//! 查询服务读数查询（连接池）

use crate::error::StorageError;
use crate::models::{LatestReading, ReadingsTable};
use crate::traits::ReadingStore;
use sqlx::{PgPool, Row};

pub struct PgReadingStore {
    pub pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReadingStore for PgReadingStore {
    async fn ping(&self) -> Result<String, StorageError> {
        let now: String = sqlx::query_scalar("select cast(now() as varchar)")
            .fetch_one(&self.pool)
            .await?;
        Ok(now)
    }

    async fn latest_reading(
        &self,
        target: &ReadingsTable,
    ) -> Result<Option<LatestReading>, StorageError> {
        let sql = format!(
            "select cast({value} as double) as value from {table} order by {time} desc limit 1",
            value = target.value_column(),
            table = target.table(),
            time = target.time_column(),
        );
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(LatestReading {
            value: row.try_get("value")?,
        }))
    }
}

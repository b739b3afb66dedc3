//! 内存读数存储

use crate::error::{StorageError, StorageErrorKind};
use crate::models::{LatestReading, ReadingsTable};
use crate::traits::ReadingStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 内存读数存储：表名 → (时间戳, 读数) 列表。
#[derive(Default)]
pub struct InMemoryReadingStore {
    tables: RwLock<HashMap<String, Vec<(i64, Option<f64>)>>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建空表（已存在则保持不变）。
    pub fn create_table(&self, table: &str) {
        if let Ok(mut tables) = self.tables.write() {
            tables.entry(table.to_string()).or_default();
        }
    }

    /// 追加一条读数，表不存在时自动创建。
    pub fn push(&self, table: &str, ts_ms: i64, value: Option<f64>) {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .entry(table.to_string())
                .or_default()
                .push((ts_ms, value));
        }
    }
}

#[async_trait::async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn ping(&self) -> Result<String, StorageError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Ok(now.as_millis().to_string())
    }

    async fn latest_reading(
        &self,
        target: &ReadingsTable,
    ) -> Result<Option<LatestReading>, StorageError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StorageError::query("lock poisoned"))?;
        let Some(rows) = tables.get(target.table()) else {
            return Err(StorageError::new(
                StorageErrorKind::UndefinedTable,
                format!("table does not exist [table={}]", target.table()),
            ));
        };
        Ok(rows
            .iter()
            .max_by_key(|(ts_ms, _)| *ts_ms)
            .map(|(_, value)| LatestReading { value: *value }))
    }
}

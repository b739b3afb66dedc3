//! 内存指标存储

use crate::error::StorageError;
use crate::traits::MetricStore;
use domain::StoredRow;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 内存指标存储，记录建表状态、已写入行与“连接”次数。
#[derive(Default)]
pub struct InMemoryMetricStore {
    rows: RwLock<Vec<StoredRow>>,
    table_created: AtomicBool,
    connections: AtomicUsize,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的全部行（按写入顺序）。
    pub fn rows(&self) -> Vec<StoredRow> {
        self.rows
            .read()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn table_created(&self) -> bool {
        self.table_created.load(Ordering::SeqCst)
    }

    /// 累计打开的连接数（每次 create_table/insert_rows 计一次）。
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn create_table(&self) -> Result<(), StorageError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        self.table_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        if !self.table_created() {
            return Err(StorageError::new(
                crate::StorageErrorKind::UndefinedTable,
                "table does not exist",
            ));
        }
        let mut guard = self
            .rows
            .write()
            .map_err(|_| StorageError::query("lock poisoned"))?;
        guard.extend_from_slice(rows);
        Ok(rows.len())
    }
}

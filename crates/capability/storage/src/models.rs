//! 存储数据模型

use crate::error::StorageError;
use crate::validation::validate_identifier;

/// 最新读数查询目标（表名与列名均已校验）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingsTable {
    table: String,
    value_column: String,
    time_column: String,
}

impl ReadingsTable {
    pub fn new(
        table: impl Into<String>,
        value_column: impl Into<String>,
        time_column: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let table = table.into();
        let value_column = value_column.into();
        let time_column = time_column.into();
        validate_identifier(&table)?;
        validate_identifier(&value_column)?;
        validate_identifier(&time_column)?;
        Ok(Self {
            table,
            value_column,
            time_column,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }
}

/// 最新读数记录。
#[derive(Debug, Clone, PartialEq)]
pub struct LatestReading {
    pub value: Option<f64>,
}

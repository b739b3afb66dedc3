//! 存储层错误类型
//!
//! 定义统一的存储错误类型，用于封装底层错误并区分类别：
//! - 连接错误（不可达、超时、I/O），可重试
//! - 表不存在，需与“无数据”区分后上报
//! - 写入超时（连接已建立但语句/提交挂起）
//! - 其余 SQL 执行错误

/// 存储错误类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// 存储不可达、连接超时或连接中断。
    Connect,
    /// 目标表不存在。
    UndefinedTable,
    /// 非法表名/列名等配置问题。
    InvalidIdentifier,
    /// 等待过程中收到退出信号。
    Cancelled,
    /// 已建立连接后，语句或提交未在时限内完成。
    Timeout,
    /// 其余查询/事务错误。
    Query,
}

#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    message: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Connect, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Query, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::Timeout, message)
    }

    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// 是否属于可通过重连恢复的错误。
    pub fn is_connect(&self) -> bool {
        self.kind == StorageErrorKind::Connect
    }

    pub fn is_undefined_table(&self) -> bool {
        self.kind == StorageErrorKind::UndefinedTable
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

/// Postgres `undefined_table`。
const UNDEFINED_TABLE_CODE: &str = "42P01";

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StorageErrorKind::Connect,
            sqlx::Error::Database(db) => {
                // QuestDB 不返回标准 SQLSTATE，只能按消息识别。
                let message = db.message();
                if db.code().as_deref() == Some(UNDEFINED_TABLE_CODE)
                    || (message.contains("table") && message.contains("does not exist"))
                {
                    StorageErrorKind::UndefinedTable
                } else {
                    StorageErrorKind::Query
                }
            }
            _ => StorageErrorKind::Query,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StorageError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::connect("store connect timed out")
    }
}

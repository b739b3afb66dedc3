//! 启动建表
//!
//! 在开始消费消息前幂等建表。存储不可达时按固定间隔重试，
//! 超过次数上限视为致命错误，调用方不得在未确认表结构的情况下继续。

use crate::error::{StorageError, StorageErrorKind};
use crate::traits::MetricStore;
use qdb_telemetry::record_schema_init_attempt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 建表重试参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaInitPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for SchemaInitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

/// 确保指标表存在。
///
/// 仅连接类错误会重试；两次尝试之间等待 `policy.delay`，最后一次失败后不再等待。
/// 其余错误立即返回。等待或建表过程中收到取消信号返回 `Cancelled`。
pub async fn ensure_schema(
    store: &dyn MetricStore,
    policy: SchemaInitPolicy,
    cancel: &CancellationToken,
) -> Result<(), StorageError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        record_schema_init_attempt();
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled()),
            result = store.create_table() => result,
        };
        match result {
            Ok(()) => {
                info!(target: "qdb.storage", attempt, "schema_ready");
                return Ok(());
            }
            Err(err) if err.is_connect() => {
                if attempt >= max_attempts {
                    error!(
                        target: "qdb.storage",
                        attempt,
                        max_attempts,
                        error = %err,
                        "schema_init_exhausted"
                    );
                    return Err(StorageError::connect(format!(
                        "store unreachable after {attempt} attempts: {err}"
                    )));
                }
                warn!(
                    target: "qdb.storage",
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "store_not_ready"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            Err(err) => {
                error!(target: "qdb.storage", attempt, error = %err, "schema_init_failed");
                return Err(err);
            }
        }
    }
}

fn cancelled() -> StorageError {
    StorageError::new(StorageErrorKind::Cancelled, "schema init cancelled")
}

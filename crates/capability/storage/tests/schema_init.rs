use async_trait::async_trait;
use domain::StoredRow;
use qdb_storage::{
    MetricStore, SchemaInitPolicy, StorageError, StorageErrorKind, ensure_schema,
};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 前 `failures` 次建表返回给定错误，之后成功。
struct FlakyStore {
    failures: usize,
    kind: StorageErrorKind,
    attempts: Mutex<Vec<Instant>>,
}

impl FlakyStore {
    fn new(failures: usize, kind: StorageErrorKind) -> Self {
        Self {
            failures,
            kind,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl MetricStore for FlakyStore {
    async fn create_table(&self) -> Result<(), StorageError> {
        let mut attempts = self.attempts.lock().expect("lock");
        attempts.push(Instant::now());
        if attempts.len() <= self.failures {
            return Err(StorageError::new(self.kind, "connection refused"));
        }
        Ok(())
    }

    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError> {
        Ok(rows.len())
    }
}

fn policy(max_attempts: u32, delay_secs: u64) -> SchemaInitPolicy {
    SchemaInitPolicy {
        max_attempts,
        delay: Duration::from_secs(delay_secs),
    }
}

fn assert_gaps(attempts: &[Instant], delay: Duration) {
    for pair in attempts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= delay && gap < delay + Duration::from_millis(50),
            "gap {gap:?}"
        );
    }
}

#[test]
fn default_policy_matches_startup_contract() {
    let policy = SchemaInitPolicy::default();
    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.delay, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_exhausts_attempts_then_fails() {
    let store = FlakyStore::new(usize::MAX, StorageErrorKind::Connect);
    let started = Instant::now();

    let err = ensure_schema(&store, policy(4, 5), &CancellationToken::new())
        .await
        .expect_err("fatal");

    assert!(err.is_connect());
    assert!(err.to_string().contains("after 4 attempts"));
    let attempts = store.attempts();
    assert_eq!(attempts.len(), 4);
    assert_gaps(&attempts, Duration::from_secs(5));
    // 最后一次失败后不再等待。
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn store_becoming_ready_stops_retrying() {
    let store = FlakyStore::new(2, StorageErrorKind::Connect);

    ensure_schema(&store, policy(10, 5), &CancellationToken::new())
        .await
        .expect("ready");

    let attempts = store.attempts();
    assert_eq!(attempts.len(), 3);
    assert_gaps(&attempts, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn non_connect_errors_are_not_retried() {
    let store = FlakyStore::new(usize::MAX, StorageErrorKind::Query);

    let err = ensure_schema(&store, policy(10, 5), &CancellationToken::new())
        .await
        .expect_err("failed");

    assert_eq!(err.kind(), StorageErrorKind::Query);
    assert_eq!(store.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_retry_wait() {
    let store = FlakyStore::new(usize::MAX, StorageErrorKind::Connect);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = ensure_schema(&store, policy(10, 3600), &cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(err.kind(), StorageErrorKind::Cancelled);
    assert_eq!(store.attempts().len(), 1);
}

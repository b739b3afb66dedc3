use async_trait::async_trait;
use domain::{InboundMessage, MetricRecord, StoredRow, TopicDimensions};
use qdb_normalize::MetricErrorPolicy;
use qdb_pipeline::{MetricPipeline, PipelineError, write_batch};
use qdb_storage::{MetricStore, StorageError, StorageErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// 第一次写入永远挂起，之后正常写入。
#[derive(Default)]
struct StallOnceStore {
    calls: AtomicUsize,
    rows: Mutex<Vec<StoredRow>>,
}

#[async_trait]
impl MetricStore for StallOnceStore {
    async fn create_table(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn insert_rows(&self, rows: &[StoredRow]) -> Result<usize, StorageError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            std::future::pending::<()>().await;
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(rows.len())
    }
}

fn message(device: &str, name: &str) -> InboundMessage {
    let body = format!(r#"{{"metrics":[{{"name":"{name}","value":1,"timestamp":1700000000}}]}}"#);
    InboundMessage::new(format!("spBv1.0/plant/DDATA/edge-1/{device}"), body.into_bytes(), 0)
}

#[tokio::test(start_paused = true)]
async fn stalled_write_times_out_as_writer_error() {
    let store = StallOnceStore::default();
    let started = Instant::now();
    let err = write_batch(
        &store,
        &TopicDimensions::default(),
        vec![MetricRecord {
            name: Some("temp".to_string()),
            alias: None,
            value: Some(1.0),
            ts_ms: 1,
        }],
        Duration::from_secs(2),
    )
    .await
    .expect_err("timed out");

    assert_eq!(err.kind(), StorageErrorKind::Timeout);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn stalled_message_is_dropped_and_next_one_written() {
    let store = Arc::new(StallOnceStore::default());
    let pipeline = MetricPipeline::new(store.clone(), MetricErrorPolicy::Reject)
        .with_write_timeout(Duration::from_secs(2));

    let err = pipeline
        .handle(&message("pump-1", "stuck"))
        .await
        .err()
        .expect("write timed out");
    assert!(matches!(err, PipelineError::Writer(ref e) if e.kind() == StorageErrorKind::Timeout));

    let (tx, rx) = mpsc::channel(4);
    tx.send(message("pump-2", "flow")).await.unwrap();
    drop(tx);
    assert_eq!(pipeline.run(rx).await, 1);

    let rows = store.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].metric_name.as_deref(), Some("flow"));
    assert_eq!(rows[0].device.as_deref(), Some("pump-2"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn run_moves_past_stalled_write() {
    let store = Arc::new(StallOnceStore::default());
    let pipeline = MetricPipeline::new(store.clone(), MetricErrorPolicy::Reject)
        .with_write_timeout(Duration::from_secs(2));
    let (tx, rx) = mpsc::channel(4);
    tx.send(message("pump-1", "stuck")).await.unwrap();
    tx.send(message("pump-2", "flow")).await.unwrap();
    drop(tx);

    let started = Instant::now();
    assert_eq!(pipeline.run(rx).await, 2);
    assert!(started.elapsed() >= Duration::from_secs(2));

    let rows = store.rows.lock().unwrap();
    let names: Vec<_> = rows.iter().filter_map(|row| row.metric_name.clone()).collect();
    assert_eq!(names, vec!["flow"]);
}

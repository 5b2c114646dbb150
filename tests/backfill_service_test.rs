//! Job-level behaviour of the backfill against the in-memory row store.

mod common;

use common::{setup_test_logging, store_with_questions, ScriptedProvider};
use embedding_backfill::adapters::memory::InMemoryRowStore;
use embedding_backfill::domain::models::{FailureKind, FieldFilter};
use embedding_backfill::{
    BackfillObserver, BackfillOptions, BackfillService, Row, RowOutcome, RowStore,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

const FIELD: &str = "embedding";

fn options() -> BackfillOptions {
    BackfillOptions {
        field: FIELD.to_string(),
        expected_dimension: Some(8),
        ..Default::default()
    }
}

/// Records the order rows are reported in.
#[derive(Default)]
struct RecordingObserver {
    started: Mutex<Option<(usize, usize)>>,
    rows: Mutex<Vec<(usize, String, bool)>>,
}

impl BackfillObserver for RecordingObserver {
    fn on_start(&self, found: usize, selected: usize) {
        *self.started.lock().unwrap() = Some((found, selected));
    }

    fn on_row(&self, position: usize, _total: usize, row: &Row, outcome: &RowOutcome) {
        let ok = matches!(outcome, RowOutcome::Succeeded { .. });
        self.rows.lock().unwrap().push((position, row.id.clone(), ok));
    }
}

/// Records start and finish events in the order they happen.
#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl BackfillObserver for EventLog {
    fn on_row_start(&self, position: usize, total: usize, row: &Row) {
        self.0
            .lock()
            .unwrap()
            .push(format!("start {position}/{total} {}", row.id));
    }

    fn on_row(&self, position: usize, total: usize, row: &Row, _outcome: &RowOutcome) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {position}/{total} {}", row.id));
    }
}

#[tokio::test]
async fn test_sequential_run_announces_each_row_before_finishing_it() {
    let store = store_with_questions(2).await;
    let provider = Arc::new(ScriptedProvider::new(8));
    let log = EventLog::default();

    BackfillService::new(provider, store)
        .with_options(options())
        .run(&log)
        .await
        .unwrap();

    assert_eq!(
        *log.0.lock().unwrap(),
        vec![
            "start 1/2 row-0",
            "done 1/2 row-0",
            "start 2/2 row-1",
            "done 2/2 row-1",
        ]
    );
}

#[tokio::test]
async fn test_example_scenario_embeds_only_unset_row() {
    setup_test_logging();
    let store = Arc::new(InMemoryRowStore::new());
    store.insert("a", "What is 2+2?").await;
    store
        .insert_with("b", "Capital of France?", FIELD, json!([0.5, 0.5]))
        .await;
    let provider = Arc::new(ScriptedProvider::new(1024));

    let report = BackfillService::new(provider.clone(), store.clone())
        .with_options(BackfillOptions {
            expected_dimension: Some(1024),
            ..options()
        })
        .run(&())
        .await
        .unwrap();

    assert_eq!(report.attempted(), 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(provider.calls(), 1);

    let written = store.field("a", FIELD).await.unwrap();
    assert_eq!(written.as_array().unwrap().len(), 1024);
    assert_eq!(store.field("b", FIELD).await.unwrap(), json!([0.5, 0.5]));
}

#[tokio::test]
async fn test_second_run_finds_nothing() {
    let store = store_with_questions(5).await;
    let provider = Arc::new(ScriptedProvider::new(8));
    let service = BackfillService::new(provider.clone(), store.clone()).with_options(options());

    let first = service.run(&()).await.unwrap();
    assert_eq!(first.succeeded(), 5);

    let second = service.run(&()).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(second.attempted(), 0);
    assert_eq!(provider.calls(), 5);
    assert!(store.fetch_missing(FIELD).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_provider_failure_is_isolated() {
    let store = store_with_questions(6).await;
    let provider = Arc::new(ScriptedProvider::new(8).fail_on("question 3"));
    let observer = RecordingObserver::default();

    let report = BackfillService::new(provider.clone(), store.clone())
        .with_options(options())
        .run(&observer)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 6);
    assert_eq!(report.succeeded(), 5);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures()[0].row_id, "row-3");
    assert_eq!(report.failures()[0].kind, FailureKind::Embedding);
    assert_eq!(provider.calls(), 6);
    assert_eq!(store.patch_calls().await, 5);

    for i in (0..6).filter(|i| *i != 3) {
        assert!(store.field(&format!("row-{i}"), FIELD).await.is_some());
    }
    assert!(store.field("row-3", FIELD).await.is_none());

    let rows = observer.rows.lock().unwrap();
    let positions: Vec<usize> = rows.iter().map(|(p, _, _)| *p).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
    assert!(!rows[3].2);
}

#[tokio::test]
async fn test_write_failure_leaves_row_eligible() {
    let store = store_with_questions(3).await;
    store.reject_writes_for("row-1").await;
    let provider = Arc::new(ScriptedProvider::new(8));
    let service = BackfillService::new(provider, store.clone()).with_options(options());

    let report = service.run(&()).await.unwrap();
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures()[0].kind, FailureKind::Write);

    let remaining = store.fetch_missing(FIELD).await.unwrap();
    assert_eq!(remaining, vec![Row::new("row-1", "question 1")]);
}

#[tokio::test]
async fn test_unacknowledged_write_fails_row_and_run_continues() {
    let store = store_with_questions(3).await;
    store.acknowledge_nothing_for("row-1").await;
    let provider = Arc::new(ScriptedProvider::new(8));

    let report = BackfillService::new(provider.clone(), store.clone())
        .with_options(options())
        .run(&())
        .await
        .unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures()[0].row_id, "row-1");
    assert_eq!(report.failures()[0].kind, FailureKind::Write);
    assert!(report.failures()[0].message.contains("acknowledged no rows"));
    assert_eq!(provider.calls(), 3);

    assert!(store.field("row-0", FIELD).await.is_some());
    assert!(store.field("row-1", FIELD).await.is_none());
    assert!(store.field("row-2", FIELD).await.is_some());
    assert_eq!(
        store.fetch_missing(FIELD).await.unwrap(),
        vec![Row::new("row-1", "question 1")]
    );
}

#[tokio::test]
async fn test_unset_count_never_increases_across_runs() {
    let store = store_with_questions(4).await;
    store.reject_writes_for("row-0").await;
    let provider = Arc::new(ScriptedProvider::new(8).fail_on("question 2"));
    let service = BackfillService::new(provider, store.clone()).with_options(options());

    let mut previous = store.count(FieldFilter::Unset(FIELD)).await.unwrap();
    for _ in 0..3 {
        service.run(&()).await.unwrap();
        let now = store.count(FieldFilter::Unset(FIELD)).await.unwrap();
        assert!(now <= previous);
        previous = now;
    }
    assert_eq!(previous, 2);
}

#[tokio::test]
async fn test_empty_store_makes_no_calls() {
    let store = Arc::new(InMemoryRowStore::new());
    let provider = Arc::new(ScriptedProvider::new(8));
    let observer = RecordingObserver::default();

    let report = BackfillService::new(provider.clone(), store.clone())
        .with_options(options())
        .run(&observer)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(provider.calls(), 0);
    assert_eq!(store.patch_calls().await, 0);
    assert_eq!(*observer.started.lock().unwrap(), Some((0, 0)));
}

#[tokio::test]
async fn test_max_rows_caps_the_run() {
    let store = store_with_questions(5).await;
    let provider = Arc::new(ScriptedProvider::new(8));
    let observer = RecordingObserver::default();

    let report = BackfillService::new(provider, store.clone())
        .with_options(BackfillOptions {
            max_rows: Some(2),
            ..options()
        })
        .run(&observer)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(*observer.started.lock().unwrap(), Some((5, 2)));
    assert_eq!(store.count(FieldFilter::Unset(FIELD)).await.unwrap(), 3);
}

#[tokio::test]
async fn test_bounded_concurrency_attempts_every_row_once() {
    let store = store_with_questions(20).await;
    let provider = Arc::new(ScriptedProvider::new(8).fail_on("question 7"));
    let observer = RecordingObserver::default();

    let report = BackfillService::new(provider.clone(), store.clone())
        .with_options(BackfillOptions {
            concurrency: 4,
            ..options()
        })
        .run(&observer)
        .await
        .unwrap();

    assert_eq!(report.attempted(), 20);
    assert_eq!(report.failed(), 1);
    assert_eq!(provider.calls(), 20);

    let rows = observer.rows.lock().unwrap();
    let ids: Vec<&str> = rows.iter().map(|(_, id, _)| id.as_str()).collect();
    let expected: Vec<String> = (0..20).map(|i| format!("row-{i}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_trait_objects_are_accepted() {
    let store: Arc<dyn RowStore> = store_with_questions(1).await;
    let provider: Arc<dyn embedding_backfill::EmbeddingProvider> =
        Arc::new(ScriptedProvider::new(8));

    let report = BackfillService::new(provider, store)
        .with_options(options())
        .run(&())
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 1);
}

//! Job executor behavior seen through an import service.
//!
//! Backpressure, completion liveness, FIFO persistence, and draining on
//! shutdown with a slow store.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{counting_completion, identity_link, signal_completion, InMemoryWriter, TestEngine};
use history_import::{IdentityLinkLogImport, ImportError};
use history_jobs::JobError;

fn import(engine: &TestEngine) -> IdentityLinkLogImport {
    IdentityLinkLogImport::new(engine.context.clone(), engine.resolver.clone())
}

/// With a queue of one and a stalled store, the third page waits.
#[tokio::test]
async fn test_backpressure_blocks_submission() {
    let engine = TestEngine::new();
    let writer = Arc::new(InMemoryWriter::gated());
    let (service, store) = engine.spawn_with_writer(import(&engine), writer, 1);
    let service = Arc::new(service);

    // Taken by the worker, parked on the gate
    let (on_complete, first_done) = signal_completion();
    service
        .execute_import(vec![identity_link("link-1", "ASSIGNEE")], on_complete)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Fills the only queue slot
    let (on_complete, _second_done) = signal_completion();
    service
        .execute_import(vec![identity_link("link-2", "ASSIGNEE")], on_complete)
        .await
        .unwrap();

    let (on_complete, third_done) = signal_completion();
    let blocked = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .execute_import(vec![identity_link("link-3", "CANDIDATE")], on_complete)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!blocked.is_finished());
    assert!(service.has_pending_work());

    store.release(3);
    blocked.await.unwrap().unwrap();
    first_done.await.unwrap();
    third_done.await.unwrap();
    service.shutdown().await.unwrap();

    let ids: Vec<String> = store.documents().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["link-1", "link-2", "link-3"]);
    assert!(!service.has_pending_work());
}

/// Every non-empty page completes exactly once: persisted, filtered out,
/// or failed in the store.
#[tokio::test]
async fn test_completion_liveness() {
    let engine = TestEngine::new();
    let (service, store) = engine.spawn(import(&engine));

    let (persisted, on_complete) = counting_completion();
    service
        .execute_import(vec![identity_link("link-1", "ASSIGNEE")], on_complete)
        .await
        .unwrap();

    let (filtered, on_complete) = counting_completion();
    service
        .execute_import(vec![identity_link("link-2", "DELETE")], on_complete)
        .await
        .unwrap();

    let (empty, on_complete) = counting_completion();
    service.execute_import(Vec::new(), on_complete).await.unwrap();

    service.shutdown().await.unwrap();
    assert_eq!(store.documents().len(), 1);

    assert_eq!(persisted.load(Ordering::SeqCst), 1);
    assert_eq!(filtered.load(Ordering::SeqCst), 1);
    // Empty pages are acknowledged by not calling back at all
    assert_eq!(empty.load(Ordering::SeqCst), 0);
}

/// A failing store still completes the page and keeps the worker alive.
#[tokio::test]
async fn test_failed_persistence_completes_page() {
    let engine = TestEngine::new();
    let (service, store) = engine.spawn(import(&engine));
    store.set_failing(true);

    let (on_complete, done) = signal_completion();
    service
        .execute_import(vec![identity_link("link-1", "ASSIGNEE")], on_complete)
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), done)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.stats().failed, 1);

    store.set_failing(false);
    let (on_complete, done) = signal_completion();
    service
        .execute_import(vec![identity_link("link-2", "ASSIGNEE")], on_complete)
        .await
        .unwrap();
    done.await.unwrap();
    service.shutdown().await.unwrap();

    let ids: Vec<String> = store.documents().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["link-2"]);
    assert_eq!(store.calls(), 2);
}

/// Shutdown persists queued pages; later pages are completed and rejected.
#[tokio::test]
async fn test_shutdown_drains_then_rejects() {
    let engine = TestEngine::new();
    let writer = Arc::new(InMemoryWriter::gated());
    let (service, store) = engine.spawn_with_writer(import(&engine), writer, 8);

    let mut pending = Vec::new();
    for i in 0..4 {
        let (on_complete, done) = signal_completion();
        service
            .execute_import(vec![identity_link(&format!("link-{i}"), "ASSIGNEE")], on_complete)
            .await
            .unwrap();
        pending.push(done);
    }

    store.release(4);
    service.shutdown().await.unwrap();
    for done in pending {
        done.await.unwrap();
    }
    assert_eq!(store.batches().len(), 4);

    let (calls, on_complete) = counting_completion();
    let result = service
        .execute_import(vec![identity_link("late", "ASSIGNEE")], on_complete)
        .await;
    assert!(matches!(result, Err(ImportError::Job(JobError::Closed(_)))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.stats().rejected, 1);
}

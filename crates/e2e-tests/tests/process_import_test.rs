//! Process instance import E2E tests.
//!
//! Drives completed and running process instance pages through real
//! import services into an in-memory store.

use pretty_assertions::assert_eq;

use e2e_tests::{process_instance, signal_completion, TestEngine};
use history_import::{InstanceScope, ProcessInstanceImport};
use history_plugins::{AdapterChain, BusinessKey, FnAdapter};

/// Completed instance spanning 5 seconds gets a 5000ms duration and the
/// resolved definition key.
#[tokio::test]
async fn test_completed_instance_duration() {
    let engine = TestEngine::new();
    let (service, store) = engine.spawn(ProcessInstanceImport::new(
        InstanceScope::Completed,
        engine.context.clone(),
        engine.resolver.clone(),
        AdapterChain::new(),
    ));

    let page = vec![process_instance(
        "pi-1",
        "2024-01-01T10:00:00.000+0000",
        Some("2024-01-01T10:00:05.000+0000"),
    )];
    let (on_complete, done) = signal_completion();
    let stats = service.execute_import(page, on_complete).await.unwrap();
    done.await.unwrap();
    service.shutdown().await.unwrap();

    assert_eq!(stats.submitted, 1);
    let documents = store.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].duration, Some(5000));
    assert_eq!(documents[0].process_definition_key, "invoice");
    assert_eq!(documents[0].process_definition_version.as_deref(), Some("1"));
    assert_eq!(documents[0].state.as_deref(), Some("COMPLETED"));
}

/// Instances of unknown definitions never reach the store.
#[tokio::test]
async fn test_unresolvable_definition_is_dropped() {
    let engine = TestEngine::new();
    let (service, store) = engine.spawn(ProcessInstanceImport::new(
        InstanceScope::Running,
        engine.context.clone(),
        engine.resolver.clone(),
        AdapterChain::new(),
    ));

    let mut orphan = process_instance("pi-orphan", "2024-01-01T10:00:00.000+0000", None);
    orphan.process_definition_id = "unknown:1:x".to_string();
    let page = vec![
        process_instance("pi-1", "2024-01-01T10:00:00.000+0000", None),
        orphan,
        process_instance("pi-2", "2024-01-01T11:00:00.000+0000", None),
    ];

    let (on_complete, done) = signal_completion();
    let stats = service.execute_import(page, on_complete).await.unwrap();
    done.await.unwrap();
    service.shutdown().await.unwrap();

    assert_eq!(stats.received, 3);
    assert_eq!(stats.dropped, 1);
    let ids: Vec<String> = store
        .documents()
        .into_iter()
        .map(|d| d.process_instance_id)
        .collect();
    assert_eq!(ids, vec!["pi-1", "pi-2"]);
    assert!(store.documents().iter().all(|d| d.end_date.is_none()));

    // Known definition fetched once, unknown one every time it is seen
    assert_eq!(engine.client.definition_fetches(), 2);
}

/// Business key adapters rewrite keys before persistence.
#[tokio::test]
async fn test_business_key_adapter_chain() {
    let engine = TestEngine::new().with_default_tenant("acme");
    let chain = AdapterChain::new().with(FnAdapter::new(
        "mask-business-keys",
        |keys: Vec<BusinessKey>| {
            keys.into_iter()
                .map(|k| BusinessKey::new(k.process_instance_id, Some("masked".to_string())))
                .collect()
        },
    ));
    let (service, store) = engine.spawn(ProcessInstanceImport::new(
        InstanceScope::Completed,
        engine.context.clone(),
        engine.resolver.clone(),
        chain,
    ));

    let mut instance = process_instance(
        "pi-1",
        "2024-01-01T10:00:00.000+0000",
        Some("2024-01-01T10:01:00.000+0000"),
    );
    instance.business_key = Some("order-42".to_string());

    let (on_complete, done) = signal_completion();
    service.execute_import(vec![instance], on_complete).await.unwrap();
    done.await.unwrap();
    service.shutdown().await.unwrap();

    let documents = store.documents();
    assert_eq!(documents[0].business_key.as_deref(), Some("masked"));
    assert_eq!(documents[0].tenant_id.as_deref(), Some("acme"));
    assert_eq!(documents[0].engine, "camunda-bpm");
}

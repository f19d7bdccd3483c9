//! End-to-end test infrastructure for the history importer.
//!
//! Provides an in-memory engine and store plus record builders so tests
//! can drive real import services page by page.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{oneshot, Semaphore};

use history_import::{
    DefinitionResolver, EngineClient, EngineContext, EngineError, ImportCursor, ImportService,
    ImportStrategy,
};
use history_jobs::{DocumentWriter, ExecutorConfig, OnComplete, PersistError};
use history_types::{
    parse_date, DefinitionDescriptor, DefinitionKind, EngineDateTime, HistoricDecisionInstance,
    HistoricDecisionInput, HistoricDecisionOutput, HistoricIdentityLinkLog,
    HistoricProcessInstance, HistoricUserOperationLog, HistoricVariableUpdate, ValueInfo,
};

/// Engine alias used by every harness.
pub const ENGINE_ALIAS: &str = "camunda-bpm";

/// Parse a test timestamp.
pub fn ts(value: &str) -> EngineDateTime {
    parse_date(value).expect("Invalid test timestamp")
}

/// Store writer keeping every persisted batch in memory.
///
/// A gated writer parks each `persist` call until [`release`](Self::release)
/// hands out a permit, which lets tests hold the executor's worker busy.
pub struct InMemoryWriter<T> {
    batches: Mutex<Vec<Vec<T>>>,
    gate: Option<Semaphore>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl<T: Clone> InMemoryWriter<T> {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            gate: None,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Let `jobs` more persist calls through the gate.
    pub fn release(&self, jobs: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(jobs);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Persisted batches in persistence order.
    pub fn batches(&self) -> Vec<Vec<T>> {
        self.batches.lock().expect("writer lock poisoned").clone()
    }

    /// All persisted documents, flattened.
    pub fn documents(&self) -> Vec<T> {
        self.batches().into_iter().flatten().collect()
    }

    /// Number of persist calls, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Default for InMemoryWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> DocumentWriter<T> for InMemoryWriter<T> {
    async fn persist(&self, batch: &[T]) -> Result<(), PersistError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| PersistError::Unrecoverable(e.to_string()))?
                .forget();
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Recoverable("store unavailable".to_string()));
        }
        self.batches
            .lock()
            .expect("writer lock poisoned")
            .push(batch.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Engine client backed by fixed definitions and instances.
#[derive(Default)]
pub struct StaticEngineClient {
    definitions: HashMap<(DefinitionKind, String), DefinitionDescriptor>,
    instances: HashMap<String, HistoricProcessInstance>,
    definition_fetches: AtomicUsize,
    instance_fetches: AtomicUsize,
}

impl StaticEngineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, kind: DefinitionKind, descriptor: DefinitionDescriptor) -> Self {
        self.definitions
            .insert((kind, descriptor.id.clone()), descriptor);
        self
    }

    pub fn with_instance(mut self, instance: HistoricProcessInstance) -> Self {
        self.instances.insert(instance.id.clone(), instance);
        self
    }

    pub fn definition_fetches(&self) -> usize {
        self.definition_fetches.load(Ordering::SeqCst)
    }

    pub fn instance_fetches(&self) -> usize {
        self.instance_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineClient for StaticEngineClient {
    async fn fetch_definition(
        &self,
        kind: DefinitionKind,
        id: &str,
    ) -> Result<DefinitionDescriptor, EngineError> {
        self.definition_fetches.fetch_add(1, Ordering::SeqCst);
        self.definitions
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| EngineError::not_found("definition", id))
    }

    async fn fetch_process_instance(
        &self,
        id: &str,
    ) -> Result<HistoricProcessInstance, EngineError> {
        self.instance_fetches.fetch_add(1, Ordering::SeqCst);
        self.instances
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("process instance", id))
    }
}

/// Cursor handle counting resets.
#[derive(Default)]
pub struct CountingCursor {
    resets: AtomicUsize,
}

impl CountingCursor {
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ImportCursor for CountingCursor {
    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "counting-cursor"
    }
}

/// Shared test harness: one engine with its client and resolver.
pub struct TestEngine {
    pub client: Arc<StaticEngineClient>,
    pub resolver: Arc<DefinitionResolver>,
    pub context: EngineContext,
}

impl TestEngine {
    /// Engine knowing `invoice:1:abc` (process) and `dish:1:xyz` (decision).
    pub fn new() -> Self {
        Self::with_client(
            StaticEngineClient::new()
                .with_definition(
                    DefinitionKind::Process,
                    DefinitionDescriptor::new("invoice:1:abc", "invoice", "1"),
                )
                .with_definition(
                    DefinitionKind::Decision,
                    DefinitionDescriptor::new("dish:1:xyz", "dish", "1"),
                ),
        )
    }

    pub fn with_client(client: StaticEngineClient) -> Self {
        let client = Arc::new(client);
        let resolver = Arc::new(DefinitionResolver::new(client.clone(), ENGINE_ALIAS));
        Self {
            client,
            resolver,
            context: EngineContext::new(ENGINE_ALIAS, None),
        }
    }

    /// Default tenant for records carrying none.
    pub fn with_default_tenant(mut self, tenant_id: &str) -> Self {
        self.context = EngineContext::new(ENGINE_ALIAS, Some(tenant_id.to_string()));
        self
    }

    /// Start an import service writing into a fresh in-memory store.
    pub fn spawn<S>(&self, strategy: S) -> (ImportService<S>, Arc<InMemoryWriter<S::Document>>)
    where
        S: ImportStrategy,
        S::Document: Clone,
    {
        self.spawn_with_writer(strategy, Arc::new(InMemoryWriter::new()), 8)
    }

    /// Start an import service with a given writer and queue capacity.
    pub fn spawn_with_writer<S>(
        &self,
        strategy: S,
        writer: Arc<InMemoryWriter<S::Document>>,
        queue_capacity: usize,
    ) -> (ImportService<S>, Arc<InMemoryWriter<S::Document>>)
    where
        S: ImportStrategy,
        S::Document: Clone,
    {
        let service = ImportService::spawn(
            strategy,
            &ExecutorConfig::with_capacity(queue_capacity),
            writer.clone(),
        );
        (service, writer)
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion callback counting its invocations.
pub fn counting_completion() -> (Arc<AtomicUsize>, OnComplete) {
    let calls = Arc::new(AtomicUsize::new(0));
    let inner = calls.clone();
    (
        calls,
        Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

/// Completion callback resolving a oneshot receiver.
pub fn signal_completion() -> (OnComplete, oneshot::Receiver<()>) {
    let (tx, rx) = oneshot::channel();
    (
        Box::new(move || {
            let _ = tx.send(());
        }),
        rx,
    )
}

/// Process instance of `invoice:1:abc` without a definition key.
pub fn process_instance(id: &str, start: &str, end: Option<&str>) -> HistoricProcessInstance {
    HistoricProcessInstance {
        id: id.to_string(),
        business_key: None,
        process_definition_id: "invoice:1:abc".to_string(),
        process_definition_key: None,
        process_definition_version: None,
        start_time: ts(start),
        end_time: end.map(ts),
        state: None,
        tenant_id: None,
    }
}

/// Variable update of `invoice:1:abc`.
pub fn variable_update(
    variable_id: &str,
    name: &str,
    engine_type: &str,
    value: Value,
    sequence_counter: i64,
) -> HistoricVariableUpdate {
    HistoricVariableUpdate {
        id: format!("{variable_id}-{sequence_counter}"),
        variable_instance_id: variable_id.to_string(),
        variable_name: name.to_string(),
        variable_type: engine_type.to_string(),
        value: Some(value),
        value_info: ValueInfo::default(),
        process_definition_id: "invoice:1:abc".to_string(),
        process_definition_key: None,
        process_instance_id: "pi-1".to_string(),
        sequence_counter,
        time: ts("2024-01-01T10:00:00.000+0000"),
        tenant_id: None,
    }
}

/// Identity link log entry of `invoice:1:abc`.
pub fn identity_link(id: &str, link_type: &str) -> HistoricIdentityLinkLog {
    HistoricIdentityLinkLog {
        id: id.to_string(),
        link_type: link_type.to_string(),
        operation_type: Some("add".to_string()),
        user_id: Some("kermit".to_string()),
        group_id: None,
        assigner_id: None,
        task_id: Some("task-1".to_string()),
        process_definition_id: Some("invoice:1:abc".to_string()),
        process_definition_key: None,
        process_instance_id: Some("pi-1".to_string()),
        time: ts("2024-01-01T10:00:00.000+0000"),
        tenant_id: None,
    }
}

/// User operation log entry of `invoice:1:abc`.
pub fn user_operation(
    id: &str,
    operation_type: &str,
    entity_type: &str,
    process_instance_id: Option<&str>,
) -> HistoricUserOperationLog {
    HistoricUserOperationLog {
        id: id.to_string(),
        operation_id: Some(format!("op-{id}")),
        operation_type: operation_type.to_string(),
        entity_type: entity_type.to_string(),
        property: Some("suspensionState".to_string()),
        new_value: None,
        process_definition_id: Some("invoice:1:abc".to_string()),
        process_definition_key: None,
        process_instance_id: process_instance_id.map(str::to_string),
        timestamp: ts("2024-01-02T00:00:00.000+0000"),
        tenant_id: None,
    }
}

/// Decision instance with one input and one matched output.
pub fn decision_instance(id: &str, definition_id: &str) -> HistoricDecisionInstance {
    HistoricDecisionInstance {
        id: id.to_string(),
        decision_definition_id: definition_id.to_string(),
        decision_definition_key: None,
        process_definition_id: Some("invoice:1:abc".to_string()),
        process_definition_key: Some("invoice".to_string()),
        process_instance_id: Some("pi-1".to_string()),
        root_process_instance_id: None,
        root_decision_instance_id: None,
        activity_id: Some("decide".to_string()),
        evaluation_time: ts("2024-01-01T10:00:00.000+0000"),
        collect_result_value: None,
        inputs: vec![HistoricDecisionInput {
            id: format!("{id}-in"),
            clause_id: "season".to_string(),
            clause_name: Some("Season".to_string()),
            value_type: "String".to_string(),
            value: Some(Value::String("Winter".to_string())),
        }],
        outputs: vec![HistoricDecisionOutput {
            id: format!("{id}-out"),
            clause_id: "dish".to_string(),
            clause_name: Some("Dish".to_string()),
            rule_id: "rule-1".to_string(),
            rule_order: Some(1),
            variable_name: Some("dish".to_string()),
            value_type: "String".to_string(),
            value: Some(Value::String("Roastbeef".to_string())),
        }],
        tenant_id: None,
    }
}

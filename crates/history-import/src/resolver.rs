//! Definition metadata cache with engine fallback.
//!
//! One resolver exists per engine and is shared by all of that engine's
//! import services. Entries are immutable once inserted and live for the
//! lifetime of the process. Misses fall through to the engine client;
//! successful fetches are memoized, failures are not, so a definition
//! imported later is found on the next lookup.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use history_types::{DefinitionDescriptor, DefinitionKind};

use crate::engine::EngineClient;

/// Concurrent definition cache keyed by definition id.
pub struct DefinitionResolver {
    client: Arc<dyn EngineClient>,
    engine_alias: String,
    process: DashMap<String, DefinitionDescriptor>,
    decision: DashMap<String, DefinitionDescriptor>,
}

impl DefinitionResolver {
    pub fn new(client: Arc<dyn EngineClient>, engine_alias: impl Into<String>) -> Self {
        Self {
            client,
            engine_alias: engine_alias.into(),
            process: DashMap::new(),
            decision: DashMap::new(),
        }
    }

    fn cache(&self, kind: DefinitionKind) -> &DashMap<String, DefinitionDescriptor> {
        match kind {
            DefinitionKind::Process => &self.process,
            DefinitionKind::Decision => &self.decision,
        }
    }

    /// Look up a definition, fetching it from the engine on a miss.
    ///
    /// Returns `None` if the engine does not know the id or the fetch
    /// failed; neither outcome is cached.
    pub async fn resolve(&self, kind: DefinitionKind, id: &str) -> Option<DefinitionDescriptor> {
        if id.is_empty() {
            return None;
        }
        if let Some(hit) = self.cached(kind, id) {
            return Some(hit);
        }

        match self.client.fetch_definition(kind, id).await {
            Ok(descriptor) => {
                debug!(engine = %self.engine_alias, kind = %kind, id, key = %descriptor.key, "Fetched definition");
                self.cache(kind).insert(id.to_string(), descriptor.clone());
                Some(descriptor)
            }
            Err(e) if e.is_not_found() => {
                debug!(engine = %self.engine_alias, kind = %kind, id, "Definition not found");
                None
            }
            Err(e) => {
                warn!(engine = %self.engine_alias, kind = %kind, id, error = %e, "Definition fetch failed");
                None
            }
        }
    }

    /// Cached entry only; never fetches.
    pub fn cached(&self, kind: DefinitionKind, id: &str) -> Option<DefinitionDescriptor> {
        self.cache(kind).get(id).map(|entry| entry.value().clone())
    }

    /// Seed the cache with a definition imported from a definition page.
    ///
    /// Repeated inserts of the same id are harmless.
    pub fn cache_definition(&self, kind: DefinitionKind, descriptor: DefinitionDescriptor) {
        self.cache(kind).insert(descriptor.id.clone(), descriptor);
    }

    /// Number of cached definitions of `kind`.
    pub fn cached_count(&self, kind: DefinitionKind) -> usize {
        self.cache(kind).len()
    }

    /// Fill in a record's definition key if it is missing.
    ///
    /// No-op when `get_key` already yields a non-empty key. Otherwise the
    /// definition is resolved by `get_id` and its key written through
    /// `set_key`. If it cannot be resolved the record is returned as is
    /// and the caller is expected to drop it.
    pub async fn enrich_with_definition_key<R, K, I, S>(
        &self,
        kind: DefinitionKind,
        mut record: R,
        get_key: K,
        get_id: I,
        set_key: S,
    ) -> R
    where
        K: Fn(&R) -> Option<&str>,
        I: Fn(&R) -> Option<&str>,
        S: FnOnce(&mut R, String),
    {
        if get_key(&record).is_some_and(|key| !key.is_empty()) {
            return record;
        }
        let Some(id) = get_id(&record).map(str::to_owned) else {
            return record;
        };
        if let Some(descriptor) = self.resolve(kind, &id).await {
            set_key(&mut record, descriptor.key);
        }
        record
    }

    pub fn engine_alias(&self) -> &str {
        &self.engine_alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use history_types::HistoricProcessInstance;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        fetches: AtomicUsize,
        known: Vec<DefinitionDescriptor>,
        failing: bool,
    }

    impl CountingClient {
        fn new(known: Vec<DefinitionDescriptor>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                known,
                failing: false,
            }
        }
    }

    #[async_trait]
    impl EngineClient for CountingClient {
        async fn fetch_definition(
            &self,
            _kind: DefinitionKind,
            id: &str,
        ) -> Result<DefinitionDescriptor, EngineError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing {
                return Err(EngineError::Request("timeout".to_string()));
            }
            self.known
                .iter()
                .find(|d| d.id == id)
                .cloned()
                .ok_or_else(|| EngineError::not_found("definition", id))
        }

        async fn fetch_process_instance(
            &self,
            id: &str,
        ) -> Result<HistoricProcessInstance, EngineError> {
            Err(EngineError::not_found("process instance", id))
        }
    }

    #[derive(Debug)]
    struct Record {
        key: Option<String>,
        definition_id: String,
    }

    #[tokio::test]
    async fn test_hit_is_memoized() {
        let client = Arc::new(CountingClient::new(vec![DefinitionDescriptor::new(
            "invoice:1", "invoice", "1",
        )]));
        let resolver = DefinitionResolver::new(client.clone(), "engine");

        let first = resolver.resolve(DefinitionKind::Process, "invoice:1").await;
        let second = resolver.resolve(DefinitionKind::Process, "invoice:1").await;

        assert_eq!(first, second);
        assert_eq!(first.unwrap().key, "invoice");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_count(DefinitionKind::Process), 1);
        assert_eq!(resolver.cached_count(DefinitionKind::Decision), 0);
    }

    #[tokio::test]
    async fn test_miss_is_not_cached() {
        let client = Arc::new(CountingClient::new(Vec::new()));
        let resolver = DefinitionResolver::new(client.clone(), "engine");

        assert!(resolver.resolve(DefinitionKind::Decision, "dish:1").await.is_none());
        assert!(resolver.resolve(DefinitionKind::Decision, "dish:1").await.is_none());
        assert_eq!(client.fetches.load(Ordering::SeqCst), 2);

        // A later definition import makes it resolvable without a fetch
        resolver.cache_definition(
            DefinitionKind::Decision,
            DefinitionDescriptor::new("dish:1", "dish", "1"),
        );
        let found = resolver.resolve(DefinitionKind::Decision, "dish:1").await;
        assert_eq!(found.unwrap().key, "dish");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_request_error_resolves_to_none() {
        let mut client = CountingClient::new(Vec::new());
        client.failing = true;
        let resolver = DefinitionResolver::new(Arc::new(client), "engine");
        assert!(resolver.resolve(DefinitionKind::Process, "x").await.is_none());
        assert!(resolver.resolve(DefinitionKind::Process, "").await.is_none());
    }

    #[tokio::test]
    async fn test_enrich_sets_missing_key() {
        let client = Arc::new(CountingClient::new(vec![DefinitionDescriptor::new(
            "invoice:1", "invoice", "1",
        )]));
        let resolver = DefinitionResolver::new(client.clone(), "engine");

        let enrich = |record: Record| {
            resolver.enrich_with_definition_key(
                DefinitionKind::Process,
                record,
                |r| r.key.as_deref(),
                |r| Some(r.definition_id.as_str()),
                |r, key| r.key = Some(key),
            )
        };

        let record = enrich(Record {
            key: None,
            definition_id: "invoice:1".into(),
        })
        .await;
        assert_eq!(record.key.as_deref(), Some("invoice"));

        let record = enrich(Record {
            key: Some(String::new()),
            definition_id: "invoice:1".into(),
        })
        .await;
        assert_eq!(record.key.as_deref(), Some("invoice"));

        let record = enrich(Record {
            key: None,
            definition_id: "unknown:1".into(),
        })
        .await;
        assert!(record.key.is_none());
    }

    #[tokio::test]
    async fn test_enrich_keeps_present_key() {
        let client = Arc::new(CountingClient::new(Vec::new()));
        let resolver = DefinitionResolver::new(client.clone(), "engine");

        let record = resolver
            .enrich_with_definition_key(
                DefinitionKind::Process,
                Record {
                    key: Some("own-key".into()),
                    definition_id: "whatever".into(),
                },
                |r| r.key.as_deref(),
                |r| Some(r.definition_id.as_str()),
                |r, key| r.key = Some(key),
            )
            .await;

        assert_eq!(record.key.as_deref(), Some("own-key"));
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);
    }
}

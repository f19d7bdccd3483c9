//! Ordered adapter chain.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::ImportAdapter;

/// Adapters for one entity type, applied in registration order.
///
/// Cloning is cheap; adapters are shared.
pub struct AdapterChain<T> {
    adapters: Vec<Arc<dyn ImportAdapter<T>>>,
}

impl<T> Clone for AdapterChain<T> {
    fn clone(&self) -> Self {
        Self {
            adapters: self.adapters.clone(),
        }
    }
}

impl<T> Default for AdapterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AdapterChain<T> {
    /// Empty chain; `apply` returns its input.
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Append an adapter (builder style).
    pub fn with(mut self, adapter: impl ImportAdapter<T> + 'static) -> Self {
        self.push(Arc::new(adapter));
        self
    }

    /// Append a shared adapter.
    pub fn push(&mut self, adapter: Arc<dyn ImportAdapter<T>>) {
        self.adapters.push(adapter);
    }

    /// Number of adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapters are registered.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapter names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Run `batch` through every adapter.
    pub fn apply(&self, batch: Vec<T>) -> Vec<T> {
        self.adapters.iter().fold(batch, |batch, adapter| {
            let before = batch.len();
            let batch = adapter.adapt(batch);
            debug!(adapter = adapter.name(), before, after = batch.len(), "Adapter applied");
            batch
        })
    }
}

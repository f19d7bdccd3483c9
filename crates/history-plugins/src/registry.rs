//! Chains for every hookable entity.

use crate::adapter::ImportAdapter;
use crate::chain::AdapterChain;
use crate::dto::{BusinessKey, PluginDecisionInput, PluginDecisionOutput, PluginVariable};

/// All adapter chains, fixed after startup.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    business_keys: AdapterChain<BusinessKey>,
    variables: AdapterChain<PluginVariable>,
    decision_inputs: AdapterChain<PluginDecisionInput>,
    decision_outputs: AdapterChain<PluginDecisionOutput>,
}

impl PluginRegistry {
    /// Registry without adapters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a registry.
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    pub fn business_keys(&self) -> &AdapterChain<BusinessKey> {
        &self.business_keys
    }

    pub fn variables(&self) -> &AdapterChain<PluginVariable> {
        &self.variables
    }

    pub fn decision_inputs(&self) -> &AdapterChain<PluginDecisionInput> {
        &self.decision_inputs
    }

    pub fn decision_outputs(&self) -> &AdapterChain<PluginDecisionOutput> {
        &self.decision_outputs
    }

    /// Total number of registered adapters.
    pub fn adapter_count(&self) -> usize {
        self.business_keys.len()
            + self.variables.len()
            + self.decision_inputs.len()
            + self.decision_outputs.len()
    }
}

/// Builder for [`PluginRegistry`].
#[derive(Default)]
pub struct PluginRegistryBuilder {
    registry: PluginRegistry,
}

impl PluginRegistryBuilder {
    pub fn with_business_key_adapter(
        mut self,
        adapter: impl ImportAdapter<BusinessKey> + 'static,
    ) -> Self {
        self.registry.business_keys = self.registry.business_keys.with(adapter);
        self
    }

    pub fn with_variable_adapter(
        mut self,
        adapter: impl ImportAdapter<PluginVariable> + 'static,
    ) -> Self {
        self.registry.variables = self.registry.variables.with(adapter);
        self
    }

    pub fn with_decision_input_adapter(
        mut self,
        adapter: impl ImportAdapter<PluginDecisionInput> + 'static,
    ) -> Self {
        self.registry.decision_inputs = self.registry.decision_inputs.with(adapter);
        self
    }

    pub fn with_decision_output_adapter(
        mut self,
        adapter: impl ImportAdapter<PluginDecisionOutput> + 'static,
    ) -> Self {
        self.registry.decision_outputs = self.registry.decision_outputs.with(adapter);
        self
    }

    pub fn build(self) -> PluginRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FnAdapter;

    #[test]
    fn test_builder_registers_per_chain() {
        let registry = PluginRegistry::builder()
            .with_business_key_adapter(FnAdapter::new("a", |b: Vec<BusinessKey>| b))
            .with_business_key_adapter(FnAdapter::new("b", |b: Vec<BusinessKey>| b))
            .with_variable_adapter(FnAdapter::new("v", |b: Vec<PluginVariable>| b))
            .build();

        assert_eq!(registry.business_keys().names(), vec!["a", "b"]);
        assert_eq!(registry.variables().len(), 1);
        assert!(registry.decision_inputs().is_empty());
        assert!(registry.decision_outputs().is_empty());
        assert_eq!(registry.adapter_count(), 3);
    }

    #[test]
    fn test_empty_registry() {
        assert_eq!(PluginRegistry::empty().adapter_count(), 0);
    }
}

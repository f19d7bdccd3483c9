//! Per-engine import context.

use history_types::EngineSettings;

/// Identity of the engine a page came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    alias: String,
    default_tenant_id: Option<String>,
}

impl EngineContext {
    pub fn new(alias: impl Into<String>, default_tenant_id: Option<String>) -> Self {
        Self {
            alias: alias.into(),
            default_tenant_id,
        }
    }

    /// Alias written as the data source of every document.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn default_tenant_id(&self) -> Option<&str> {
        self.default_tenant_id.as_deref()
    }

    /// Record tenant if present, else the engine default, else none.
    pub fn resolve_tenant(&self, record_tenant: Option<&str>) -> Option<String> {
        record_tenant
            .filter(|t| !t.is_empty())
            .or(self.default_tenant_id())
            .map(str::to_owned)
    }
}

impl From<&EngineSettings> for EngineContext {
    fn from(settings: &EngineSettings) -> Self {
        Self::new(settings.alias.clone(), settings.default_tenant_id.clone())
    }
}

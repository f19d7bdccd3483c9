//! Definition metadata referenced by instance-level records.

use serde::{Deserialize, Serialize};

/// Which kind of definition an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Process,
    Decision,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionKind::Process => write!(f, "process"),
            DefinitionKind::Decision => write!(f, "decision"),
        }
    }
}

/// Process or decision definition metadata.
///
/// Immutable once cached by the definition resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionDescriptor {
    pub id: String,
    pub key: String,
    pub version: String,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl DefinitionDescriptor {
    /// Create a descriptor with the mandatory fields.
    pub fn new(id: impl Into<String>, key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            version: version.into(),
            version_tag: None,
            name: None,
            tenant_id: None,
        }
    }

    /// Set the version tag.
    pub fn with_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = Some(tag.into());
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = DefinitionDescriptor::new("invoice:3:abc", "invoice", "3")
            .with_version_tag("v3")
            .with_name("Invoice")
            .with_tenant("acme");

        assert_eq!(descriptor.key, "invoice");
        assert_eq!(descriptor.version, "3");
        assert_eq!(descriptor.version_tag.as_deref(), Some("v3"));
        assert_eq!(descriptor.tenant_id.as_deref(), Some("acme"));
    }

    #[test]
    fn test_descriptor_json_is_camel_case() {
        let descriptor = DefinitionDescriptor::new("d1", "dish", "1").with_version_tag("t");
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(json.contains("\"versionTag\":\"t\""));
        assert!(json.contains("\"tenantId\":null"));
    }
}
